//! Breadth-first discovery of the dependency closure of an executable.

use super::reference::{DependencyReference, FRAMEWORK_SUFFIX, LibraryKind};
use super::resolver::{DependencyResolver, ResolveAnchor, normalize};
use crate::bundler::error::Result;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Version directory whose binary is preferred inside a framework.
pub const FRAMEWORK_VERSION: &str = "A";

/// Source of dependency listings for binaries on disk.
pub trait DependencyInspector {
    /// Returns the load paths referenced by `binary`, in listing order.
    fn dependencies(&self, binary: &Path) -> Result<Vec<DependencyReference>>;
}

/// A dependency reference paired with the unit it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    reference: DependencyReference,
    path: PathBuf,
    kind: LibraryKind,
}

impl ResolvedDependency {
    /// Pairs `reference` with its resolved location.
    pub fn new(reference: DependencyReference, path: PathBuf, kind: LibraryKind) -> Self {
        Self {
            reference,
            path,
            kind,
        }
    }

    /// The reference through which this dependency was first discovered.
    pub fn reference(&self) -> &DependencyReference {
        &self.reference
    }

    /// `.framework` directory or dylib file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Framework or dylib.
    pub fn kind(&self) -> LibraryKind {
        self.kind
    }

    /// Basename of the unit, used as its name inside the bundle.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The Mach-O file carrying this dependency's own load commands.
    pub fn binary_path(&self) -> PathBuf {
        match self.kind {
            LibraryKind::Framework => self.path.join(framework_binary(&self.path)),
            LibraryKind::Dylib => self.path.clone(),
        }
    }
}

/// Location of a framework's inner binary, relative to the `.framework` directory.
///
/// Prefers `Versions/A/<Name>`, then whichever version `Versions/Current`
/// points at, then the shallow `<Name>` layout used by iOS frameworks.
pub fn framework_binary(framework_dir: &Path) -> PathBuf {
    let name = framework_name(framework_dir);
    let versions = framework_dir.join("Versions");

    let preferred = Path::new("Versions").join(FRAMEWORK_VERSION).join(&name);
    if framework_dir.join(&preferred).is_file() {
        return preferred;
    }

    if let Ok(current) = std::fs::read_link(versions.join("Current")) {
        let candidate = Path::new("Versions").join(current).join(&name);
        if framework_dir.join(&candidate).is_file() {
            return candidate;
        }
    }

    PathBuf::from(name)
}

/// `Foo` for `/x/Foo.framework`.
pub fn framework_name(framework_dir: &Path) -> String {
    let file_name = framework_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .strip_suffix(FRAMEWORK_SUFFIX)
        .map(str::to_string)
        .unwrap_or(file_name)
}

/// Identity of a library on disk: the canonical path when it exists, so
/// the same file reached through a symlinked prefix is recorded once.
fn dedup_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Clone)]
enum Node {
    Executable(PathBuf),
    Dependency(ResolvedDependency),
}

/// The transitive set of bundleable dependencies reachable from an executable.
///
/// Node 0 is the executable; edges point from a binary to what it loads.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<Node, ()>,
    root: NodeIndex,
    inspected: BTreeSet<PathBuf>,
}

impl DependencyGraph {
    fn new(executable: PathBuf) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Node::Executable(executable));
        Self {
            graph,
            root,
            inspected: BTreeSet::new(),
        }
    }

    /// The executable discovery started from.
    pub fn executable(&self) -> &Path {
        match &self.graph[self.root] {
            Node::Executable(path) => path,
            Node::Dependency(dep) => dep.path(),
        }
    }

    /// Every dependency in discovery (breadth-first) order.
    pub fn dependencies(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.graph.node_indices().filter_map(|idx| self.dependency(idx))
    }

    /// Dependencies ordered so that each one precedes everything that loads it.
    ///
    /// Within a cycle the order is arbitrary but every member appears once.
    pub fn bottom_up(&self) -> Vec<&ResolvedDependency> {
        let mut order = Vec::with_capacity(self.len());
        let mut dfs = DfsPostOrder::new(&self.graph, self.root);
        while let Some(idx) = dfs.next(&self.graph) {
            if let Some(dep) = self.dependency(idx) {
                order.push(dep);
            }
        }
        order
    }

    /// Dependencies of the given kind, in discovery order.
    pub fn of_kind(&self, kind: LibraryKind) -> Vec<&ResolvedDependency> {
        self.dependencies().filter(|d| d.kind() == kind).collect()
    }

    /// Framework dependencies, in discovery order.
    pub fn frameworks(&self) -> Vec<&ResolvedDependency> {
        self.of_kind(LibraryKind::Framework)
    }

    /// Dylib dependencies, in discovery order.
    pub fn dylibs(&self) -> Vec<&ResolvedDependency> {
        self.of_kind(LibraryKind::Dylib)
    }

    /// Direct dependencies of the binary whose unit is `path` (or of the executable).
    pub fn direct_dependencies(&self, path: &Path) -> Vec<&ResolvedDependency> {
        let Some(node) = self.find(path) else {
            return Vec::new();
        };
        let mut direct: Vec<_> = self
            .graph
            .neighbors(node)
            .filter_map(|idx| self.dependency(idx))
            .collect();
        direct.sort_by(|a, b| a.path().cmp(b.path()));
        direct
    }

    /// Returns true if a dependency resolved to `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.dependencies().any(|d| d.path() == path)
    }

    /// Binaries whose listings were inspected during discovery.
    pub fn inspected(&self) -> &BTreeSet<PathBuf> {
        &self.inspected
    }

    /// Number of dependencies (the executable is not counted).
    pub fn len(&self) -> usize {
        self.graph.node_count() - 1
    }

    /// Returns true when the executable has no bundleable dependencies.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dependency(&self, idx: NodeIndex) -> Option<&ResolvedDependency> {
        match &self.graph[idx] {
            Node::Dependency(dep) => Some(dep),
            Node::Executable(_) => None,
        }
    }

    fn find(&self, path: &Path) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&idx| match &self.graph[idx] {
            Node::Executable(exe) => exe == path,
            Node::Dependency(dep) => dep.path() == path,
        })
    }
}

/// Builds a [`DependencyGraph`] by repeatedly inspecting binaries.
pub struct GraphBuilder<'a, I: ?Sized, R: ?Sized> {
    inspector: &'a I,
    resolver: &'a R,
    frameworks: Option<Vec<PathBuf>>,
    dylibs: Option<Vec<PathBuf>>,
}

impl<'a, I, R> GraphBuilder<'a, I, R>
where
    I: DependencyInspector + ?Sized,
    R: DependencyResolver + ?Sized,
{
    /// Creates a builder with discovery enabled for both categories.
    pub fn new(inspector: &'a I, resolver: &'a R) -> Self {
        Self {
            inspector,
            resolver,
            frameworks: None,
            dylibs: None,
        }
    }

    /// Uses `frameworks` instead of discovering frameworks.
    pub fn framework_overrides(mut self, frameworks: Option<Vec<PathBuf>>) -> Self {
        self.frameworks = frameworks;
        self
    }

    /// Uses `dylibs` instead of discovering dylibs.
    pub fn dylib_overrides(mut self, dylibs: Option<Vec<PathBuf>>) -> Self {
        self.dylibs = dylibs;
        self
    }

    fn is_overridden(&self, kind: LibraryKind) -> bool {
        match kind {
            LibraryKind::Framework => self.frameworks.is_some(),
            LibraryKind::Dylib => self.dylibs.is_some(),
        }
    }

    /// Discovers every non-system library reachable from `executable`.
    ///
    /// Each binary is inspected at most once and each library recorded at
    /// most once (keyed by its canonical path), so cycles and diamonds
    /// terminate. Unresolvable
    /// references are skipped on the assumption the OS provides them.
    pub fn build(&self, executable: &Path) -> Result<DependencyGraph> {
        let executable = normalize(executable);
        let executable_key = dedup_key(&executable);
        let mut graph = DependencyGraph::new(executable.clone());
        let mut by_path: HashMap<PathBuf, NodeIndex> = HashMap::new();
        let mut queue: VecDeque<(NodeIndex, PathBuf)> = VecDeque::new();
        queue.push_back((graph.root, executable.clone()));

        let overrides = [
            (LibraryKind::Framework, self.frameworks.as_deref()),
            (LibraryKind::Dylib, self.dylibs.as_deref()),
        ];
        for (kind, paths) in overrides {
            for path in paths.unwrap_or_default() {
                let path = normalize(path);
                let present = match kind {
                    LibraryKind::Framework => path.is_dir(),
                    LibraryKind::Dylib => path.is_file(),
                };
                if !present {
                    crate::bail!("explicit {} {} does not exist", kind, path.display());
                }
                let key = dedup_key(&path);
                if by_path.contains_key(&key) {
                    continue;
                }
                let reference = DependencyReference::new(path.to_string_lossy());
                let dep = ResolvedDependency::new(reference, path, kind);
                let binary = dep.binary_path();
                let idx = graph.graph.add_node(Node::Dependency(dep));
                graph.graph.add_edge(graph.root, idx, ());
                by_path.insert(key, idx);
                queue.push_back((idx, binary));
            }
        }

        if self.frameworks.is_some() && self.dylibs.is_some() {
            log::debug!("Explicit framework and dylib lists given, skipping discovery");
            return Ok(graph);
        }

        while let Some((node, binary)) = queue.pop_front() {
            if !graph.inspected.insert(binary.clone()) {
                continue;
            }

            let references = self.inspector.dependencies(&binary)?;
            log::debug!(
                "{} references {} load paths",
                binary.display(),
                references.len()
            );
            let anchor = ResolveAnchor {
                binary: &binary,
                executable: &executable,
            };

            for reference in references {
                if reference.is_system() {
                    continue;
                }
                let kind = reference.library_kind();
                if self.is_overridden(kind) {
                    log::debug!("  - {} (skipped, explicit {} list)", reference, kind);
                    continue;
                }

                let Some(path) = self.resolver.resolve(&reference, &anchor) else {
                    log::debug!(
                        "  - {} (unresolved, assuming it is provided at runtime)",
                        reference
                    );
                    continue;
                };
                let path = normalize(&path);
                let key = dedup_key(&path);
                if key == executable_key {
                    continue;
                }

                if let Some(&existing) = by_path.get(&key) {
                    if existing != node {
                        graph.graph.update_edge(node, existing, ());
                    }
                    continue;
                }

                log::debug!("  - {} -> {}", reference, path.display());
                let dep = ResolvedDependency::new(reference, path, kind);
                let dep_binary = dep.binary_path();
                let idx = graph.graph.add_node(Node::Dependency(dep));
                graph.graph.add_edge(node, idx, ());
                by_path.insert(key, idx);
                queue.push_back((idx, dep_binary));
            }
        }

        Ok(graph)
    }
}
