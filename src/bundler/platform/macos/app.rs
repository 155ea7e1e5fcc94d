//! Application bundle (.app) assembly for one configured app.

use super::dylib::{FilesystemResolver, GraphBuilder};
use super::info_plist::write_info_plist;
use super::install_name::{InstallNameRewriter, RewriteSummary, Violation};
use super::layout::{BundleLayout, BundledDependency};
use super::sign::{SigningOutcome, sign_bundle};
use super::tools::BinaryTools;
use crate::bundler::builder::product::locate_product;
use crate::bundler::dylib::LibraryKind;
use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{AppSettings, Settings};
use std::path::{Path, PathBuf};

/// Everything produced while assembling one bundle.
#[derive(Debug, Clone)]
pub struct AppBundle {
    /// App name from the configuration.
    pub name: String,
    /// The `.app` directory.
    pub path: PathBuf,
    /// Installed main executable.
    pub executable: PathBuf,
    /// Embedded libraries in the order they were installed and signed.
    pub dependencies: Vec<BundledDependency>,
    /// Installed resource files and directories.
    pub resources: Vec<PathBuf>,
    pub rewrite: RewriteSummary,
    /// References still escaping the bundle after rewriting.
    pub violations: Vec<Violation>,
    pub signing: SigningOutcome,
}

impl AppBundle {
    /// Number of embedded libraries of `kind`.
    pub fn count(&self, kind: LibraryKind) -> usize {
        self.dependencies.iter().filter(|d| d.kind == kind).count()
    }
}

/// Assembles the bundle for `app`: build, discover, copy, rewrite, sign.
///
/// Configuration problems are reported before anything is written. Any
/// earlier bundle at the same path is replaced.
pub async fn bundle_app<T: BinaryTools + ?Sized>(
    tools: &T,
    settings: &Settings,
    app: &AppSettings,
) -> Result<AppBundle> {
    app.validate()?;
    let package_dir = settings.package_dir();
    let frameworks = resolve_overrides(settings, app, "framework", app.frameworks.as_deref())?;
    let dylibs = resolve_overrides(settings, app, "dylib", app.dylibs.as_deref())?;
    for (what, path) in [
        ("Info.plist override", app.info_plist.as_deref()),
        (
            "entitlements",
            app.signing.as_ref().and_then(|s| s.entitlements.as_deref()),
        ),
    ] {
        if let Some(path) = path {
            require_exists(settings, app, what, path)?;
        }
    }

    log::info!("Bundling {} ({})", app.bundle_name(), app.platform);

    let product = locate_product(app, package_dir, settings.configuration()).await?;
    let layout = BundleLayout::new(settings.output_dir(), &app.name, app.platform);
    layout.create().await?;

    let resolver = FilesystemResolver::new(&product.build_dir, package_dir)
        .exclude(settings.output_dir());
    let graph = GraphBuilder::new(tools, &resolver)
        .framework_overrides(frameworks)
        .dylib_overrides(dylibs)
        .build(&product.executable)?;
    log::info!(
        "Found {} frameworks and {} dylibs",
        graph.frameworks().len(),
        graph.dylibs().len()
    );

    let executable = layout.install_executable(&product.executable).await?;
    let dependencies = layout.install_dependencies(&graph.bottom_up()).await?;
    let resources = match &app.resources {
        Some(entries) => layout.install_resources(entries, package_dir).await?,
        None => Vec::new(),
    };
    write_info_plist(app, package_dir, &layout.info_plist_path()).await?;

    let rewriter = InstallNameRewriter::new(tools, layout.rpath());
    let rewrite = rewriter.rewrite(&executable, &dependencies)?;
    let violations = if dependencies.is_empty() {
        Vec::new()
    } else {
        rewriter.verify(&executable, &dependencies)?
    };
    for violation in &violations {
        log::warn!("{}", violation);
    }

    let signing = sign_bundle(
        tools,
        app.signing.as_ref(),
        package_dir,
        layout.root(),
        &dependencies,
    )
    .await?;

    log::info!("Finished {}", layout.root().display());
    Ok(AppBundle {
        name: app.name.clone(),
        path: layout.root().to_path_buf(),
        executable,
        dependencies,
        resources,
        rewrite,
        violations,
        signing,
    })
}

fn resolve_overrides(
    settings: &Settings,
    app: &AppSettings,
    what: &str,
    paths: Option<&[PathBuf]>,
) -> Result<Option<Vec<PathBuf>>> {
    let Some(paths) = paths else {
        return Ok(None);
    };
    paths
        .iter()
        .map(|path| require_exists(settings, app, what, path))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn require_exists(settings: &Settings, app: &AppSettings, what: &str, path: &Path) -> Result<PathBuf> {
    let resolved = settings.resolve_path(path);
    if resolved.exists() {
        Ok(resolved)
    } else {
        Err(Error::Configuration {
            app: app.name.clone(),
            reason: format!("{} {} does not exist", what, resolved.display()),
        })
    }
}
