//! Resolution of symbolic load paths to files on disk.
//!
//! `@loader_path` and `@executable_path` are substituted directly. `@rpath`
//! references cannot be resolved statically, so they are looked up in an
//! ordered list of candidate directories derived from the build output and
//! package root, with a recursive walk as the last resort.

use super::reference::{DependencyReference, FRAMEWORK_SUFFIX, LibraryKind, ReferenceKind};
use path_absolutize::Absolutize;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Subdirectories of the build output directory searched for `@rpath` references.
const BUILD_SEARCH_DIRS: &[&str] = &["", "deps", "PackageFrameworks"];

/// Subdirectories of the package root searched for `@rpath` references.
const PACKAGE_SEARCH_DIRS: &[&str] = &["", "Frameworks", "lib"];

/// The binaries a reference is resolved relative to.
#[derive(Debug, Clone, Copy)]
pub struct ResolveAnchor<'a> {
    /// Binary whose dependency listing contained the reference.
    pub binary: &'a Path,
    /// Main executable of the bundle, for `@executable_path`.
    pub executable: &'a Path,
}

/// Maps a dependency reference to the unit that must be copied into the bundle.
///
/// Returns the `.framework` directory for framework references and the file
/// itself for dylibs, or `None` when the reference cannot be found.
pub trait DependencyResolver {
    /// Resolves `reference` as seen from `anchor`.
    fn resolve(&self, reference: &DependencyReference, anchor: &ResolveAnchor<'_>) -> Option<PathBuf>;
}

/// Resolver backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FilesystemResolver {
    build_dir: PathBuf,
    package_dir: PathBuf,
    excluded: Vec<PathBuf>,
    walk_fallback: bool,
}

impl FilesystemResolver {
    /// Creates a resolver searching `build_dir` first, then `package_dir`.
    pub fn new(build_dir: impl Into<PathBuf>, package_dir: impl Into<PathBuf>) -> Self {
        Self {
            build_dir: normalize(&build_dir.into()),
            package_dir: normalize(&package_dir.into()),
            excluded: Vec::new(),
            walk_fallback: true,
        }
    }

    /// Never match anything below `dir` (typically the bundle output directory).
    pub fn exclude(mut self, dir: impl AsRef<Path>) -> Self {
        self.excluded.push(normalize(dir.as_ref()));
        self
    }

    /// Enables or disables the recursive directory walk fallback.
    pub fn walk_fallback(mut self, enabled: bool) -> Self {
        self.walk_fallback = enabled;
        self
    }

    /// Ordered directories probed for `@rpath` references before any walk.
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        let build = BUILD_SEARCH_DIRS.iter().map(|sub| self.build_dir.join(sub));
        let package = PACKAGE_SEARCH_DIRS.iter().map(|sub| self.package_dir.join(sub));
        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in build.chain(package) {
            let dir = normalize(&dir);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    fn resolve_rpath(&self, reference: &DependencyReference) -> Option<PathBuf> {
        let kind = reference.library_kind();
        let tail = reference.tail();
        let name = reference.bundle_name()?;

        for dir in self.candidate_dirs() {
            for candidate in [dir.join(tail), dir.join(name)] {
                if let Some(unit) = existing_unit(&candidate, kind) {
                    if !self.is_excluded(&unit) {
                        return Some(unit);
                    }
                }
            }
        }

        if !self.walk_fallback {
            return None;
        }

        log::debug!(
            "{} not found in candidate directories, falling back to recursive search",
            reference
        );
        let roots = [&self.build_dir, &self.package_dir];
        roots.iter().find_map(|root| self.walk_for(root, name, kind))
    }

    fn walk_for(&self, root: &Path, name: &str, kind: LibraryKind) -> Option<PathBuf> {
        if !root.is_dir() {
            return None;
        }
        let found = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry.path()))
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry.file_name().to_str() == Some(name)
                    && entry.path().is_dir() == (kind == LibraryKind::Framework)
            })?;
        log::info!("Located {} by recursive search: {}", name, found.path().display());
        Some(normalize(found.path()))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|dir| path.starts_with(dir))
    }
}

impl DependencyResolver for FilesystemResolver {
    fn resolve(&self, reference: &DependencyReference, anchor: &ResolveAnchor<'_>) -> Option<PathBuf> {
        let kind = reference.library_kind();
        match reference.kind() {
            ReferenceKind::System => None,
            ReferenceKind::LoaderRelative => {
                let base = anchor.binary.parent()?;
                existing_unit(&base.join(reference.tail()), kind)
            }
            ReferenceKind::ExecutableRelative => {
                let base = anchor.executable.parent()?;
                existing_unit(&base.join(reference.tail()), kind)
            }
            ReferenceKind::RpathRelative => self.resolve_rpath(reference),
            ReferenceKind::Absolute => existing_unit(Path::new(reference.as_str()), kind),
        }
    }
}

/// Truncates a path inside a framework to the `.framework` directory itself.
///
/// `/x/Foo.framework/Versions/A/Foo` becomes `/x/Foo.framework`. Paths without
/// a framework component yield `None`.
pub fn framework_root(path: &Path) -> Option<PathBuf> {
    let mut root = PathBuf::new();
    for component in path.components() {
        root.push(component);
        if let Component::Normal(name) = component {
            let name = name.to_string_lossy();
            if name.len() > FRAMEWORK_SUFFIX.len() && name.ends_with(FRAMEWORK_SUFFIX) {
                return Some(root);
            }
        }
    }
    None
}

/// Lexically normalizes a path to an absolute one without touching symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    match path.absolutize() {
        Ok(absolute) => absolute.into_owned(),
        Err(_) => path.to_path_buf(),
    }
}

fn existing_unit(candidate: &Path, kind: LibraryKind) -> Option<PathBuf> {
    let candidate = normalize(candidate);
    match kind {
        LibraryKind::Framework => {
            let root = framework_root(&candidate)?;
            root.is_dir().then_some(root)
        }
        LibraryKind::Dylib => candidate.is_file().then_some(candidate),
    }
}
