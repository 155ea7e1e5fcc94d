//! Command line argument parsing and validation.

use crate::bundler::BuildConfiguration;
use crate::metadata::DEFAULT_CONFIG;
use clap::Parser;
use std::path::PathBuf;

/// Application bundler for Mach-O executables
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_app",
    version,
    about = "Assembles self-contained .app bundles for Mach-O executables",
    long_about = "Builds each app declared in Bundler.toml, embeds its non-system frameworks and dylibs, \
rewrites every load path to @rpath, and optionally code signs the result.

Usage:
  kodegen_bundler_app
  kodegen_bundler_app --app MyApp --configuration debug
  kodegen_bundler_app --config apps.toml --output-dir dist --keep-going

Exit code 0 = every selected bundle was produced."
)]
pub struct Args {
    /// Configuration file, relative to the package directory
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Package root containing Cargo.toml
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub package_dir: PathBuf,

    /// Directory the .app bundles are written to [default: <package-dir>/target/bundle]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cargo build configuration
    #[arg(long, value_enum, default_value_t = BuildConfiguration::Release)]
    pub configuration: BuildConfiguration,

    /// Bundle only this app (repeatable)
    #[arg(short, long = "app", value_name = "NAME")]
    pub apps: Vec<String>,

    /// Keep bundling the remaining apps after one fails
    #[arg(short, long)]
    pub keep_going: bool,

    /// Log every resolved reference and tool invocation
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration file path, resolved against the package directory.
    pub fn config_path(&self) -> PathBuf {
        if self.config.is_absolute() {
            self.config.clone()
        } else {
            self.package_dir.join(&self.config)
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = self.apps.iter().find(|name| name.trim().is_empty()) {
            return Err(format!("App name cannot be empty: {:?}", name));
        }
        Ok(())
    }
}
