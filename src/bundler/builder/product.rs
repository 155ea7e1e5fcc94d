//! Building the executable an app bundle is assembled from.

use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{AppSettings, BuildConfiguration};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// A built (or prebuilt) executable and the directory it was produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// The Mach-O executable to bundle.
    pub executable: PathBuf,
    /// Build-output directory searched first for `@rpath` dependencies.
    pub build_dir: PathBuf,
}

/// Produces the executable for `app`.
///
/// A configured prebuilt binary is used as-is, with its parent directory as
/// the build-output directory. Otherwise `cargo build --bin <product>` runs
/// in `package_dir` and the binary is taken from the cargo target directory.
pub async fn locate_product(
    app: &AppSettings,
    package_dir: &Path,
    configuration: BuildConfiguration,
) -> Result<Product> {
    if let Some(binary) = &app.binary {
        let executable = if binary.is_absolute() {
            binary.clone()
        } else {
            package_dir.join(binary)
        };
        if !executable.is_file() {
            return Err(Error::BuildFailed {
                product: product_label(app),
                reason: format!("prebuilt binary {} does not exist", executable.display()),
            });
        }
        let build_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| package_dir.to_path_buf());
        log::debug!("Using prebuilt binary {}", executable.display());
        return Ok(Product {
            executable,
            build_dir,
        });
    }

    build_product(&app.product, package_dir, configuration).await
}

async fn build_product(
    product: &str,
    package_dir: &Path,
    configuration: BuildConfiguration,
) -> Result<Product> {
    log::info!("Building product '{}' ({})", product, configuration);

    let mut cmd = Command::new("cargo");
    cmd.current_dir(package_dir);
    cmd.arg("build").arg("--bin").arg(product);
    if configuration == BuildConfiguration::Release {
        cmd.arg("--release");
    }

    let output = cmd.output().await.map_err(|error| Error::CommandFailed {
        command: format!("cargo build --bin {}", product),
        error,
    })?;
    if !output.status.success() {
        return Err(Error::BuildFailed {
            product: product.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let target_dir = target_directory(package_dir).await?;
    let build_dir = target_dir.join(configuration.profile_dir());
    let executable = build_dir.join(product);
    if !executable.is_file() {
        return Err(Error::BuildFailed {
            product: product.to_string(),
            reason: format!("binary not found at {} after build", executable.display()),
        });
    }

    log::debug!("Built {}", executable.display());
    Ok(Product {
        executable,
        build_dir,
    })
}

/// Cargo target directory of the package in `package_dir`.
async fn target_directory(package_dir: &Path) -> Result<PathBuf> {
    let output = Command::new("cargo")
        .current_dir(package_dir)
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: "cargo metadata --format-version 1 --no-deps".to_string(),
            error,
        })?;
    if !output.status.success() {
        return Err(Error::ToolFailed {
            command: "cargo metadata --format-version 1 --no-deps".to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_target_directory(&String::from_utf8_lossy(&output.stdout))
}

/// Extracts `target_directory` from `cargo metadata` JSON.
fn parse_target_directory(metadata: &str) -> Result<PathBuf> {
    #[derive(serde::Deserialize)]
    struct Metadata {
        target_directory: PathBuf,
    }

    let metadata: Metadata = serde_json::from_str(metadata)?;
    Ok(metadata.target_directory)
}

fn product_label(app: &AppSettings) -> String {
    if app.product.is_empty() {
        app.name.clone()
    } else {
        app.product.clone()
    }
}
