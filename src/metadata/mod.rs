//! Loading of the `Bundler.toml` configuration file.

use crate::bundler::AppSettings;
use crate::error::{CliError, Result};
use anyhow::Context as _;
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name, looked up in the package directory.
pub const DEFAULT_CONFIG: &str = "Bundler.toml";

/// Parsed `Bundler.toml`.
///
/// ```toml
/// [apps.MyApp]
/// product = "myapp"
/// identifier = "com.example.myapp"
/// version = "1.0.0"
/// ```
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// App tables keyed by app name.
    #[serde(default)]
    pub apps: BTreeMap<String, AppSettings>,
}

impl BundlerConfig {
    /// Parses configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CliError::ConfigNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&text)?;
        if config.apps.is_empty() {
            return Err(CliError::NoApps {
                path: path.to_path_buf(),
            }
            .into());
        }
        log::debug!("Loaded {} apps from {}", config.apps.len(), path.display());
        Ok(config)
    }

    /// App settings in name order, each carrying its table key as name.
    pub fn into_apps(self) -> Vec<AppSettings> {
        self.apps
            .into_iter()
            .map(|(name, mut app)| {
                app.name = name;
                app
            })
            .collect()
    }
}
