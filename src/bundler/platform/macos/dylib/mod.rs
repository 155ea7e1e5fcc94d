//! Dynamic library dependency discovery for macOS and iOS app bundles.
//!
//! Discovery works on live binaries: each binary's load commands are listed
//! (`otool -L`), every non-system reference is resolved to a framework
//! directory or dylib file, and the result is recursed into until the closure
//! is complete. The closure is returned as a [`DependencyGraph`] so the
//! copy, rewrite and signing stages can work from one immutable snapshot.

mod graph;
mod reference;
mod resolver;

pub use graph::{
    DependencyGraph, DependencyInspector, FRAMEWORK_VERSION, GraphBuilder, ResolvedDependency,
    framework_binary, framework_name,
};
pub use reference::{
    DependencyReference, FRAMEWORK_SUFFIX, LibraryKind, ReferenceKind, is_system_path,
    parse_dependency_listing,
};
pub use resolver::{DependencyResolver, FilesystemResolver, ResolveAnchor, framework_root, normalize};
