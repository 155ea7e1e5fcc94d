//! Per-app bundle configuration.

use super::{Platform, SigningPolicy};
use crate::bundler::{Error, Result};
use std::path::PathBuf;

/// One app bundle to assemble.
///
/// Decoded from an `[apps.<Name>]` table of `Bundler.toml`; the table key
/// becomes [`AppSettings::name`]. Relative paths are resolved against the
/// package directory.
///
/// # Configuration
///
/// ```toml
/// [apps.MyApp]
/// product = "myapp"
/// platform = "macOS"
/// identifier = "com.example.myapp"
/// version = "1.0.0"
/// resources = ["assets/*"]
/// ```
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSettings {
    /// Display name; also the bundle directory and executable name.
    #[serde(skip)]
    pub name: String,

    /// Cargo binary target producing the executable.
    ///
    /// Required unless `binary` is given.
    #[serde(default)]
    pub product: String,

    /// Target platform.
    ///
    /// Default: macOS
    #[serde(default)]
    pub platform: Platform,

    /// Bundle identifier in reverse domain notation.
    #[serde(default)]
    pub identifier: String,

    /// Version string written to `CFBundleVersion` and `CFBundleShortVersionString`.
    #[serde(default)]
    pub version: String,

    /// Minimum OS version (`LSMinimumSystemVersion` / `MinimumOSVersion`).
    #[serde(default)]
    pub minimum_os_version: Option<String>,

    /// Prebuilt executable; skips the cargo build when set.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Frameworks to embed instead of discovering them.
    #[serde(default)]
    pub frameworks: Option<Vec<PathBuf>>,

    /// Dylibs to embed instead of discovering them.
    #[serde(default)]
    pub dylibs: Option<Vec<PathBuf>>,

    /// Info.plist to copy instead of generating one.
    #[serde(default)]
    pub info_plist: Option<PathBuf>,

    /// Resource files, directories or glob patterns copied into the resource slot.
    #[serde(default)]
    pub resources: Option<Vec<String>>,

    /// Code signing policy. Absent means unsigned.
    #[serde(default)]
    pub signing: Option<SigningPolicy>,
}

impl AppSettings {
    /// Creates settings for `name` with every other field defaulted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Directory name of the bundle, e.g. `MyApp.app`.
    pub fn bundle_name(&self) -> String {
        format!("{}.app", self.name)
    }

    /// Checks that every required field is filled in.
    ///
    /// Runs before any filesystem work for this app.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::Configuration {
            app: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.name.contains('/') {
            return Err(invalid("name must not contain '/'"));
        }
        if self.identifier.trim().is_empty() {
            return Err(invalid("identifier is empty"));
        }
        if self.version.trim().is_empty() {
            return Err(invalid("version is empty"));
        }
        if self.binary.is_none() && self.product.trim().is_empty() {
            return Err(invalid("product is empty and no prebuilt binary is given"));
        }
        Ok(())
    }
}
