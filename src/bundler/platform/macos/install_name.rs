//! Rewriting of install names and load paths inside a bundle.
//!
//! After the copy stage every bundled binary still refers to its
//! dependencies by their original locations. The rewriter gives each bundled
//! library an `@rpath`-relative identity, points every reference at those
//! identities, and gives the executable the rpath entry that makes `@rpath`
//! resolve to the bundle's dependency directory.

use super::dylib::DependencyInspector;
use super::layout::BundledDependency;
use super::tools::BinaryTools;
use crate::bundler::error::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Counts of what [`InstallNameRewriter::rewrite`] changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    /// `install_name_tool -id` calls.
    pub ids: usize,
    /// `install_name_tool -change` calls.
    pub changes: usize,
    /// Whether the rpath entry had to be added.
    pub rpath_added: bool,
}

/// A load path in a bundled binary that escapes the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub binary: PathBuf,
    pub reference: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} still references {}",
            self.binary.display(),
            self.reference
        )
    }
}

/// Rewrites the load commands of one bundle.
pub struct InstallNameRewriter<'a, T: BinaryTools + ?Sized> {
    tools: &'a T,
    rpath: &'a str,
}

impl<'a, T: BinaryTools + ?Sized> InstallNameRewriter<'a, T> {
    /// Rewriter adding `rpath` to the executable.
    pub fn new(tools: &'a T, rpath: &'a str) -> Self {
        Self { tools, rpath }
    }

    /// Makes the bundle self-consistent.
    ///
    /// Must run after every dependency has been copied. With no bundled
    /// dependencies nothing is touched, not even the rpath.
    pub fn rewrite(&self, executable: &Path, bundled: &[BundledDependency]) -> Result<RewriteSummary> {
        let mut summary = RewriteSummary::default();
        if bundled.is_empty() {
            log::debug!("No bundled dependencies, leaving load commands untouched");
            return Ok(summary);
        }

        for dependency in bundled {
            self.tools
                .set_install_name(&dependency.binary, &dependency.install_name)
                .with_context(|| format!("setting install name of {}", dependency.name))?;
            summary.ids += 1;
        }

        let rpaths = self.tools.rpaths(executable)?;
        if rpaths.iter().any(|rpath| rpath == self.rpath) {
            log::debug!("{} already has rpath {}", executable.display(), self.rpath);
        } else {
            self.tools.add_rpath(executable, self.rpath)?;
            summary.rpath_added = true;
            log::debug!("Added rpath {} to {}", self.rpath, executable.display());
        }

        let install_names = install_names(bundled);
        for binary in binaries(executable, bundled) {
            for reference in self.tools.dependencies(binary)? {
                if reference.is_system() {
                    continue;
                }
                let Some(new) = reference
                    .bundle_name()
                    .and_then(|name| install_names.get(name))
                else {
                    continue;
                };
                if reference.as_str() == *new {
                    continue;
                }
                log::debug!("  {}: {} -> {}", binary.display(), reference, new);
                self.tools
                    .change_install_name(binary, reference.as_str(), new)?;
                summary.changes += 1;
            }
        }

        log::info!(
            "Rewrote load commands: {} install names, {} references",
            summary.ids,
            summary.changes
        );
        Ok(summary)
    }

    /// Lists every non-system reference that does not use a bundled install name.
    ///
    /// Also reports a missing rpath on the executable when there are
    /// dependencies to find through it.
    pub fn verify(&self, executable: &Path, bundled: &[BundledDependency]) -> Result<Vec<Violation>> {
        let mut violations = Vec::new();
        let install_names = install_names(bundled);

        for binary in binaries(executable, bundled) {
            for reference in self.tools.dependencies(binary)? {
                if reference.is_system() {
                    continue;
                }
                let bundled_name = reference
                    .bundle_name()
                    .and_then(|name| install_names.get(name));
                if bundled_name.is_some_and(|name| *name == reference.as_str()) {
                    continue;
                }
                violations.push(Violation {
                    binary: binary.to_path_buf(),
                    reference: reference.as_str().to_string(),
                });
            }
        }

        if !bundled.is_empty() && !self.tools.rpaths(executable)?.iter().any(|r| r == self.rpath) {
            violations.push(Violation {
                binary: executable.to_path_buf(),
                reference: format!("(missing rpath {})", self.rpath),
            });
        }

        Ok(violations)
    }
}

/// Bundle name (`Foo.framework`, `libbar.dylib`) to install name.
fn install_names(bundled: &[BundledDependency]) -> HashMap<&str, &str> {
    bundled
        .iter()
        .map(|dep| (dep.name.as_str(), dep.install_name.as_str()))
        .collect()
}

fn binaries<'b>(executable: &'b Path, bundled: &'b [BundledDependency]) -> impl Iterator<Item = &'b Path> {
    std::iter::once(executable).chain(bundled.iter().map(|dep| dep.binary.as_path()))
}
