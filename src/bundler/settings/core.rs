//! Core Settings struct and implementations.

use super::{AppSettings, BuildConfiguration};
use std::path::{Path, PathBuf};

/// What to do with the remaining apps after one fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Stop at the first failing app.
    #[default]
    Abort,
    /// Assemble every app and report all failures at the end.
    Continue,
}

/// Main settings for bundler operations.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder).
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_app::bundler::{AppSettings, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_app::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .package_dir(".")
///     .app(AppSettings {
///         product: "myapp".into(),
///         identifier: "com.example.myapp".into(),
///         version: "1.0.0".into(),
///         ..AppSettings::new("MyApp")
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Package root: cargo manifest directory and base for relative paths.
    package_dir: PathBuf,

    /// Directory the `.app` bundles are written to.
    output_dir: PathBuf,

    /// Cargo profile used when building products.
    configuration: BuildConfiguration,

    /// Apps to bundle, in processing order.
    apps: Vec<AppSettings>,

    failure_policy: FailurePolicy,
}

impl Settings {
    /// Returns the package root.
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Returns the bundle output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the build configuration.
    pub fn configuration(&self) -> BuildConfiguration {
        self.configuration
    }

    /// Returns the apps to bundle.
    pub fn apps(&self) -> &[AppSettings] {
        &self.apps
    }

    /// Looks up an app by name.
    pub fn app(&self, name: &str) -> Option<&AppSettings> {
        self.apps.iter().find(|app| app.name == name)
    }

    /// Returns the multi-app failure policy.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Resolves a configured path against the package directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.package_dir.join(path)
        }
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    pub(super) fn new(
        package_dir: PathBuf,
        output_dir: PathBuf,
        configuration: BuildConfiguration,
        apps: Vec<AppSettings>,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            package_dir,
            output_dir,
            configuration,
            apps,
            failure_policy,
        }
    }
}
