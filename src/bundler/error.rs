//! Error types for bundler operations.
//!
//! Provides contextual error chaining, filesystem errors carrying the offending
//! path, and external tool failures carrying the full command line.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
///
/// Resolution failures are deliberately absent: an unresolved dependency is
/// skipped, not reported.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "copying framework")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Child process could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Full command line
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// Child process ran but exited unsuccessfully.
    #[error("command `{command}` exited with {status}: {stderr}")]
    ToolFailed {
        /// Full command line
        command: String,
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// Required external tool is not on `PATH`.
    #[error("required tool `{0}` not found in PATH (install the Xcode command line tools)")]
    ToolNotFound(String),

    /// A bundle's configuration is incomplete or inconsistent.
    #[error("invalid configuration for app '{app}': {reason}")]
    Configuration {
        /// App (bundle) name from the configuration file
        app: String,
        /// What is wrong
        reason: String,
    },

    /// Two distinct libraries would land at the same path in the flat dependency directory.
    #[error("{name} is provided by both {} and {}; bundled libraries need unique names", first.display(), second.display())]
    NameCollision {
        /// Basename shared by both libraries
        name: String,
        /// Library discovered first
        first: PathBuf,
        /// Library discovered later
        second: PathBuf,
    },

    /// The upstream build did not produce a usable executable.
    #[error("build of product '{product}' failed: {reason}")]
    BuildFailed {
        /// Product (binary target) name
        product: String,
        /// What went wrong
        reason: String,
    },

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking a directory tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// JSON deserialization error (cargo metadata).
    #[error("{0}")]
    JsonError(#[from] serde_json::error::Error),

    /// Invalid resource glob pattern.
    #[error("{0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Resource glob execution error.
    #[error("{0}")]
    Glob(#[from] glob::GlobError),

    /// Regular expression error.
    #[error("{0}")]
    RegexError(#[from] regex::Error),

    /// Property list (Info.plist) writing error.
    #[error("{0}")]
    Plist(#[from] plist::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

impl Error {
    /// Wraps an error with the name of the app whose assembly it aborted.
    pub fn for_app(self, app: &str) -> Self {
        match self {
            Self::Configuration { .. } => self,
            other => Self::Context(format!("bundling app '{app}'"), Box::new(other)),
        }
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
