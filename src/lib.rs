//! Application bundler for Mach-O executables.
//!
//! Assembles `.app` bundles for macOS, iOS, tvOS and visionOS from a Rust
//! executable and the frameworks and dylibs it links against:
//! - dependency closure discovery through `otool`
//! - load path rewriting to `@rpath` through `install_name_tool`
//! - bottom-up re-signing through `codesign`
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
