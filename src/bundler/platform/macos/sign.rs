//! Code signing of an assembled bundle.
//!
//! Signing runs after every load command has been rewritten, because
//! `install_name_tool` invalidates existing signatures. Embedded libraries are
//! signed bottom-up before the bundle itself, since sealing the bundle hashes
//! the signatures of everything inside it.

use super::layout::BundledDependency;
use super::tools::BinaryTools;
use crate::bundler::error::{ErrorExt, Result};
use crate::bundler::settings::SigningPolicy;
use crate::bundler::utils::fs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory holding a bundle's detached signature.
const SIGNATURE_DIR: &str = "_CodeSignature";

/// Resource seal left behind by older signing tools.
const CODE_RESOURCES: &str = "CodeResources";

/// Arguments for one `codesign` run, shared by every target of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodesignInvocation {
    identity: String,
    entitlements: Option<PathBuf>,
    options: Vec<String>,
    deep: bool,
}

impl CodesignInvocation {
    /// Builds the invocation for `policy`, or `None` when it has no identity.
    ///
    /// Entitlements are resolved against `base_dir` when relative.
    pub fn from_policy(policy: &SigningPolicy, base_dir: &Path) -> Option<Self> {
        let identity = policy.identity()?;
        Some(Self {
            identity: identity.to_string(),
            entitlements: policy.entitlements.as_ref().map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                }
            }),
            options: policy.effective_options(),
            deep: policy.deep,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn entitlements(&self) -> Option<&Path> {
        self.entitlements.as_deref()
    }

    /// Full argument vector for signing `target`.
    ///
    /// `--force --sign <identity> [--entitlements <path>] [--options <a,b>] [--deep] <target>`
    pub fn arguments(&self, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["--force".into(), "--sign".into(), self.identity.clone().into()];
        if let Some(entitlements) = &self.entitlements {
            args.push("--entitlements".into());
            args.push(entitlements.clone().into_os_string());
        }
        if !self.options.is_empty() {
            args.push("--options".into());
            args.push(self.options.join(",").into());
        }
        if self.deep {
            args.push("--deep".into());
        }
        args.push(target.as_os_str().to_owned());
        args
    }
}

/// What the signing stage did for one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningOutcome {
    /// No policy, or the policy is disabled.
    Disabled,
    /// Enabled, but no identity was configured.
    SkippedNoIdentity,
    /// Every dependency and then the bundle were signed.
    Signed {
        /// Number of embedded libraries signed before the bundle.
        dependencies: usize,
    },
}

/// Removes `_CodeSignature` directories and stray `CodeResources` files below `path`.
///
/// Returns the number of artifacts removed. A plain file path has nothing to strip.
pub async fn strip_signature_artifacts(path: &Path) -> Result<usize> {
    let mut stale = Vec::new();
    let mut walker = walkdir::WalkDir::new(path).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        let name = entry.file_name();
        if entry.file_type().is_dir() && name == SIGNATURE_DIR {
            stale.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        } else if !entry.file_type().is_dir() && name == CODE_RESOURCES {
            stale.push(entry.path().to_path_buf());
        }
    }

    for artifact in &stale {
        log::debug!("Removing stale signature artifact {}", artifact.display());
        fs::remove_path(artifact).await?;
    }
    Ok(stale.len())
}

/// Signs the embedded libraries of a bundle and then the bundle itself.
///
/// `dependencies` must already be in bottom-up order. Any codesign failure
/// aborts the bundle.
pub async fn sign_bundle<T: BinaryTools + ?Sized>(
    tools: &T,
    policy: Option<&SigningPolicy>,
    base_dir: &Path,
    bundle_root: &Path,
    dependencies: &[BundledDependency],
) -> Result<SigningOutcome> {
    let Some(policy) = policy.filter(|policy| policy.enabled) else {
        log::debug!("Signing disabled for {}", bundle_root.display());
        return Ok(SigningOutcome::Disabled);
    };

    let Some(invocation) = CodesignInvocation::from_policy(policy, base_dir) else {
        log::warn!(
            "Signing enabled but no identity configured; {} is left unsigned",
            bundle_root.display()
        );
        return Ok(SigningOutcome::SkippedNoIdentity);
    };

    if let Some(entitlements) = invocation.entitlements() {
        tokio::fs::metadata(entitlements)
            .await
            .fs_context("reading entitlements", entitlements)?;
    }

    log::info!(
        "Signing {} with identity '{}'",
        bundle_root.display(),
        invocation.identity()
    );

    for dependency in dependencies {
        let removed = strip_signature_artifacts(&dependency.path).await?;
        if removed > 0 {
            log::debug!("Stripped {} signature artifacts from {}", removed, dependency.name);
        }
        tools.codesign(&dependency.path, &invocation)?;
        log::debug!("Signed {}", dependency.name);
    }

    tools.codesign(bundle_root, &invocation)?;
    log::debug!("Signed {}", bundle_root.display());

    Ok(SigningOutcome::Signed {
        dependencies: dependencies.len(),
    })
}
