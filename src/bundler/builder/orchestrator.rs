//! Main bundler orchestration and coordination.
//!
//! This module provides the [`Bundler`] orchestrator that assembles every
//! configured app bundle in turn and applies the multi-app failure policy.

use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::platform::macos::app::{AppBundle, bundle_app};
use crate::bundler::platform::macos::tools::{BinaryTools, SystemTools};
use crate::bundler::settings::{FailurePolicy, Settings};

use super::checksum::calculate_sha256;

/// A finished app bundle and its checksum.
#[derive(Debug, Clone)]
pub struct BundledApp {
    /// What was assembled.
    pub bundle: AppBundle,
    /// SHA-256 of the whole bundle tree.
    pub checksum: String,
}

/// An app whose assembly failed under [`FailurePolicy::Continue`].
#[derive(Debug)]
pub struct BundleFailure {
    pub app: String,
    pub error: Error,
}

/// Outcome of a bundling run.
#[derive(Debug, Default)]
pub struct BundleReport {
    /// Bundles produced, in processing order.
    pub bundled: Vec<BundledApp>,
    /// Apps that failed; only ever non-empty under [`FailurePolicy::Continue`].
    pub failures: Vec<BundleFailure>,
}

impl BundleReport {
    /// Returns true when every selected app was bundled.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Main bundler orchestrator.
///
/// Apps are processed sequentially, each fully (build, copy, rewrite, sign)
/// before the next one starts.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_app::bundler::{Bundler, Settings};
///
/// # async fn example(settings: Settings) -> kodegen_bundler_app::bundler::Result<()> {
/// let bundler = Bundler::new(settings)?;
/// let report = bundler.bundle().await?;
///
/// for app in &report.bundled {
///     println!("Created: {}", app.bundle.path.display());
///     println!("SHA256: {}", app.checksum);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bundler<T: BinaryTools = SystemTools> {
    settings: Settings,
    tools: T,
}

impl Bundler<SystemTools> {
    /// Creates a bundler using the Xcode command line tools on `PATH`.
    ///
    /// # Errors
    ///
    /// Fails when `otool` or `install_name_tool` is not installed.
    pub fn new(settings: Settings) -> Result<Self> {
        Ok(Self::with_tools(settings, SystemTools::detect()?))
    }
}

impl<T: BinaryTools> Bundler<T> {
    /// Creates a bundler driving the given tool implementation.
    pub fn with_tools(settings: Settings, tools: T) -> Self {
        Self { settings, tools }
    }

    /// Assembles every selected app.
    ///
    /// Under [`FailurePolicy::Abort`] the first failure is returned as the
    /// error. Under [`FailurePolicy::Continue`] failures are collected in the
    /// report and the remaining apps are still processed.
    pub async fn bundle(&self) -> Result<BundleReport> {
        let output_dir = self.settings.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .fs_context("creating output directory", output_dir)?;

        let mut report = BundleReport::default();
        for app in self.settings.apps() {
            match self.bundle_one(app).await {
                Ok(bundled) => report.bundled.push(bundled),
                Err(error) => {
                    let error = error.for_app(&app.name);
                    match self.settings.failure_policy() {
                        FailurePolicy::Abort => return Err(error),
                        FailurePolicy::Continue => {
                            log::error!("{}", error);
                            report.failures.push(BundleFailure {
                                app: app.name.clone(),
                                error,
                            });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    async fn bundle_one(&self, app: &crate::bundler::AppSettings) -> Result<BundledApp> {
        let bundle = bundle_app(&self.tools, &self.settings, app).await?;
        let checksum = calculate_sha256(&bundle.path).await?;
        Ok(BundledApp { bundle, checksum })
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the tool implementation in use.
    pub fn tools(&self) -> &T {
        &self.tools
    }
}
