//! External tool detection and availability checking.
//!
//! The rewrite and signing stages shell out to the Xcode command line tools.
//! Lookups are cached so repeated invocations across bundles do not rescan `PATH`.

use crate::bundler::{Error, Result};
use std::path::PathBuf;
use std::sync::LazyLock;

/// `otool`, used to list load commands and dependencies.
pub static OTOOL: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("otool"));

/// `install_name_tool`, used to rewrite install names and rpaths.
pub static INSTALL_NAME_TOOL: LazyLock<Option<PathBuf>> =
    LazyLock::new(|| locate("install_name_tool"));

/// `codesign`, used to sign bundled binaries and the app bundle.
pub static CODESIGN: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("codesign"));

fn locate(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            log::debug!("Found {} at: {}", name, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", name, e);
            None
        }
    }
}

/// Returns the cached location of `tool`, or [`Error::ToolNotFound`].
pub fn require(tool: &LazyLock<Option<PathBuf>>, name: &str) -> Result<PathBuf> {
    LazyLock::force(tool)
        .clone()
        .ok_or_else(|| Error::ToolNotFound(name.to_string()))
}
