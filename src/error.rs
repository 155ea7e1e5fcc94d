//! Error types for the command line layer.
//!
//! Bundling failures come through as [`crate::bundler::Error`]; this module
//! adds configuration-file and argument errors on top of them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument and configuration file errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Generic errors from anyhow
    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// The configuration file does not exist
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The configuration file declares no apps
    #[error("No apps declared in {}", path.display())]
    NoApps {
        /// Configuration file
        path: PathBuf,
    },

    /// One or more apps failed under `--keep-going`
    #[error("{failed} of {total} app bundles failed")]
    BundlesFailed {
        /// Number of failed apps
        failed: usize,
        /// Number of selected apps
        total: usize,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error as Bundle;

        let bundle_error = match self {
            Self::Bundler(error) => Some(innermost(error)),
            _ => None,
        };

        match (self, bundle_error) {
            (Self::Cli(CliError::ConfigNotFound { .. }), _) => vec![
                "Create a Bundler.toml with an [apps.<Name>] table".to_string(),
                "Or point at an existing file with --config".to_string(),
            ],
            (Self::Cli(CliError::NoApps { .. }), _) => {
                vec!["Declare at least one [apps.<Name>] table".to_string()]
            }
            (Self::Toml(_), _) => vec!["Check the configuration file syntax and field names".to_string()],
            (_, Some(Bundle::ToolNotFound(_))) => {
                vec!["Install the Xcode command line tools: xcode-select --install".to_string()]
            }
            (_, Some(Bundle::Configuration { .. })) => {
                vec!["Fix the app's entry in the configuration file".to_string()]
            }
            (_, Some(Bundle::NameCollision { .. })) => vec![
                "List the library you want in the app's explicit frameworks or dylibs".to_string(),
            ],
            (_, Some(Bundle::BuildFailed { .. })) => vec![
                "Run the cargo build yourself to see the full compiler output".to_string(),
            ],
            (_, Some(Bundle::ToolFailed { .. })) => {
                vec!["Re-run with --verbose to see every tool invocation".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

fn innermost(error: &crate::bundler::Error) -> &crate::bundler::Error {
    match error {
        crate::bundler::Error::Context(_, inner) => innermost(inner),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_look_through_context() {
        let error = BundlerError::Bundler(
            crate::bundler::Error::ToolNotFound("otool".into()).for_app("Demo"),
        );
        assert!(error.recovery_suggestions()[0].contains("xcode-select"));
    }

    #[test]
    fn test_config_not_found_message() {
        let error = BundlerError::from(CliError::ConfigNotFound {
            path: PathBuf::from("/x/Bundler.toml"),
        });
        assert_eq!(
            error.to_string(),
            "CLI error: Configuration file not found: /x/Bundler.toml"
        );
    }
}
