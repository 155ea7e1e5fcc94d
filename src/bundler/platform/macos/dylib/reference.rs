//! Dependency references as reported by `otool -L`, and their classification.

use std::fmt;
use std::path::Path;

/// Suffix marking a versioned library bundle (framework) directory.
pub const FRAMEWORK_SUFFIX: &str = ".framework";

const LOADER_PATH: &str = "@loader_path/";
const EXECUTABLE_PATH: &str = "@executable_path/";
const RPATH: &str = "@rpath/";

/// How a dependency reference is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `/usr/lib/...` or `/System/...`; provided by the OS and never bundled.
    System,
    /// Absolute filesystem path.
    Absolute,
    /// `@loader_path/...`, relative to the referencing binary's directory.
    LoaderRelative,
    /// `@executable_path/...`, relative to the main executable's directory.
    ExecutableRelative,
    /// `@rpath/...` or a bare relative name, resolved by runtime search.
    RpathRelative,
}

/// Shape of the library a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryKind {
    /// Directory-based `.framework` bundle with an inner versioned binary.
    Framework,
    /// Single-file `.dylib` (or any other flat shared object).
    Dylib,
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framework => write!(f, "framework"),
            Self::Dylib => write!(f, "dylib"),
        }
    }
}

/// One load-path token taken from a binary's dependency listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyReference {
    raw: String,
}

impl DependencyReference {
    /// Wraps a raw load path.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The load path exactly as embedded in the binary.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Classifies the anchor of this reference.
    pub fn kind(&self) -> ReferenceKind {
        let raw = self.raw.as_str();
        if is_system_path(raw) {
            ReferenceKind::System
        } else if raw.starts_with(LOADER_PATH) {
            ReferenceKind::LoaderRelative
        } else if raw.starts_with(EXECUTABLE_PATH) {
            ReferenceKind::ExecutableRelative
        } else if raw.starts_with(RPATH) || !raw.starts_with('/') {
            ReferenceKind::RpathRelative
        } else {
            ReferenceKind::Absolute
        }
    }

    /// Returns true for references the OS loader satisfies on its own.
    pub fn is_system(&self) -> bool {
        self.kind() == ReferenceKind::System
    }

    /// The path below the anchor token (the whole path for absolute references).
    pub fn tail(&self) -> &str {
        let raw = self.raw.as_str();
        [LOADER_PATH, EXECUTABLE_PATH, RPATH]
            .iter()
            .find_map(|anchor| raw.strip_prefix(anchor))
            .unwrap_or(raw)
    }

    /// Framework if any path component carries the `.framework` suffix.
    pub fn library_kind(&self) -> LibraryKind {
        if self.framework_component().is_some() {
            LibraryKind::Framework
        } else {
            LibraryKind::Dylib
        }
    }

    /// Name of the unit that gets copied into the bundle.
    ///
    /// `Foo.framework` for framework references, the file name for dylibs.
    pub fn bundle_name(&self) -> Option<&str> {
        match self.framework_component() {
            Some(component) => Some(component),
            None => Path::new(self.tail()).file_name().and_then(|n| n.to_str()),
        }
    }

    fn framework_component(&self) -> Option<&str> {
        self.tail()
            .split('/')
            .find(|component| component.len() > FRAMEWORK_SUFFIX.len() && component.ends_with(FRAMEWORK_SUFFIX))
    }
}

impl fmt::Display for DependencyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Determines if a load path belongs to the OS and must not be bundled.
///
/// `self` is what `otool` prints for the binary's own placeholder entry.
pub fn is_system_path(path: &str) -> bool {
    path == "self" || path.starts_with("/System/") || path.starts_with("/usr/lib/")
}

/// Parses `otool -L` output into the ordered list of referenced load paths.
///
/// The first line names the inspected binary and is dropped. Every other
/// non-empty line contributes its first whitespace-delimited token. Lines
/// ending in `:` are per-architecture headers of universal binaries. Empty or
/// garbled output yields no references.
pub fn parse_dependency_listing(output: &str) -> Vec<DependencyReference> {
    let mut references: Vec<DependencyReference> = Vec::new();

    for line in output.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() || line.ends_with(':') {
            continue;
        }
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        if references.iter().any(|r| r.as_str() == token) {
            continue;
        }
        references.push(DependencyReference::new(token));
    }

    references
}
