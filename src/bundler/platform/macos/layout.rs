//! Directory structure of an app bundle and the copies that populate it.
//!
//! ```text
//! macOS                          iOS / tvOS / visionOS
//! MyApp.app/                     MyApp.app/
//! └── Contents/                  ├── MyApp
//!     ├── Info.plist             ├── Info.plist
//!     ├── MacOS/MyApp            ├── Frameworks/
//!     ├── Frameworks/            └── <resources>
//!     └── Resources/
//! ```

use super::dylib::{LibraryKind, ResolvedDependency, framework_binary};
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::settings::Platform;
use crate::bundler::utils::fs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Runtime search path of the desktop layout.
pub const MACOS_RPATH: &str = "@executable_path/../Frameworks";

/// Runtime search path of the flat mobile layout.
pub const IOS_RPATH: &str = "@executable_path/Frameworks";

/// Permission bits of installed executables and libraries.
const EXECUTABLE_MODE: u32 = 0o755;

/// A dependency after it has been copied into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledDependency {
    /// Basename inside the dependency directory (`Foo.framework`, `libbar.dylib`).
    pub name: String,
    /// Framework or dylib.
    pub kind: LibraryKind,
    /// Where it was copied from.
    pub source: PathBuf,
    /// Copied `.framework` directory or dylib file.
    pub path: PathBuf,
    /// Mach-O file inside [`path`](Self::path) carrying the load commands.
    pub binary: PathBuf,
    /// `@rpath`-relative install name the binary is given.
    pub install_name: String,
}

/// Target paths of one app bundle.
#[derive(Debug, Clone)]
pub struct BundleLayout {
    platform: Platform,
    root: PathBuf,
    executable_name: String,
}

impl BundleLayout {
    /// Layout for `<output_dir>/<app_name>.app`.
    pub fn new(output_dir: &Path, app_name: &str, platform: Platform) -> Self {
        Self {
            platform,
            root: output_dir.join(format!("{app_name}.app")),
            executable_name: app_name.to_string(),
        }
    }

    /// The `.app` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Platform the layout was created for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn contents_dir(&self) -> PathBuf {
        if self.platform.is_macos() {
            self.root.join("Contents")
        } else {
            self.root.clone()
        }
    }

    /// Directory holding the main executable.
    pub fn executable_dir(&self) -> PathBuf {
        if self.platform.is_macos() {
            self.contents_dir().join("MacOS")
        } else {
            self.root.clone()
        }
    }

    /// Final path of the main executable.
    pub fn executable_path(&self) -> PathBuf {
        self.executable_dir().join(&self.executable_name)
    }

    /// Flat directory every framework and dylib is copied into.
    pub fn frameworks_dir(&self) -> PathBuf {
        self.contents_dir().join("Frameworks")
    }

    /// Directory non-binary resources are copied into.
    pub fn resources_dir(&self) -> PathBuf {
        if self.platform.is_macos() {
            self.contents_dir().join("Resources")
        } else {
            self.root.clone()
        }
    }

    /// Location of the bundle's Info.plist.
    pub fn info_plist_path(&self) -> PathBuf {
        self.contents_dir().join("Info.plist")
    }

    /// Runtime search path pointing the executable at [`frameworks_dir`](Self::frameworks_dir).
    pub fn rpath(&self) -> &'static str {
        if self.platform.is_macos() {
            MACOS_RPATH
        } else {
            IOS_RPATH
        }
    }

    /// Creates the empty skeleton, removing any previous bundle at the same path.
    pub async fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.root, true).await?;
        fs::create_dir_all(&self.executable_dir(), false).await?;
        fs::create_dir_all(&self.frameworks_dir(), false).await?;
        fs::create_dir_all(&self.resources_dir(), false).await?;
        log::debug!("Created bundle skeleton at {}", self.root.display());
        Ok(())
    }

    /// Copies the main executable into its slot with mode 0755.
    pub async fn install_executable(&self, source: &Path) -> Result<PathBuf> {
        let dest = self.executable_path();
        fs::copy_file(source, &dest).await?;
        fs::set_mode(&dest, EXECUTABLE_MODE).await?;
        log::debug!("Installed executable {} -> {}", source.display(), dest.display());
        Ok(dest)
    }

    /// Copies each dependency into the flat dependency directory by basename.
    ///
    /// An existing entry of the same name is replaced, never merged.
    /// Frameworks are copied as whole trees with their symlinks intact.
    ///
    /// Fails with [`Error::NameCollision`] before copying anything when two
    /// distinct libraries share a basename.
    pub async fn install_dependencies(
        &self,
        dependencies: &[&ResolvedDependency],
    ) -> Result<Vec<BundledDependency>> {
        check_unique_names(dependencies)?;
        let frameworks_dir = self.frameworks_dir();
        let mut bundled = Vec::with_capacity(dependencies.len());

        for dependency in dependencies {
            let name = dependency.name();
            let dest = frameworks_dir.join(&name);
            fs::remove_path(&dest).await?;

            let (binary, install_name) = match dependency.kind() {
                LibraryKind::Framework => {
                    fs::copy_dir(dependency.path(), &dest).await?;
                    let relative = framework_binary(&dest);
                    let install_name = format!(
                        "@rpath/{}/{}",
                        name,
                        relative.to_string_lossy().replace('\\', "/")
                    );
                    (dest.join(relative), install_name)
                }
                LibraryKind::Dylib => {
                    fs::copy_file(dependency.path(), &dest).await?;
                    (dest.clone(), format!("@rpath/{}", name))
                }
            };

            if !binary.is_file() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "library binary missing after copy",
                ))
                .fs_context("installing dependency", &binary);
            }
            // Homebrew installs libraries read-only; install_name_tool needs write access.
            fs::set_mode(&binary, EXECUTABLE_MODE).await?;

            log::debug!("Installed {} {} -> {}", dependency.kind(), name, dest.display());
            bundled.push(BundledDependency {
                name,
                kind: dependency.kind(),
                source: dependency.path().to_path_buf(),
                path: dest,
                binary,
                install_name,
            });
        }

        Ok(bundled)
    }

    /// Copies resources into the resource slot.
    ///
    /// Each entry is a file, a directory, or a glob pattern, relative to
    /// `base_dir` unless absolute. Files keep their basename; directories are
    /// copied whole. A literal path that does not exist is an error; a
    /// pattern with no matches only logs a warning.
    pub async fn install_resources(&self, entries: &[String], base_dir: &Path) -> Result<Vec<PathBuf>> {
        let resources_dir = self.resources_dir();
        let mut installed = Vec::new();

        for entry in entries {
            let pattern = if Path::new(entry).is_absolute() {
                PathBuf::from(entry)
            } else {
                base_dir.join(entry)
            };

            let matches = if is_glob(entry) {
                let pattern = pattern.to_string_lossy().into_owned();
                let mut matches = Vec::new();
                for path in glob::glob(&pattern)? {
                    matches.push(path?);
                }
                if matches.is_empty() {
                    log::warn!("Resource pattern '{}' matched no files", entry);
                }
                matches
            } else {
                if !pattern.exists() {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "resource does not exist",
                    ))
                    .fs_context("copying resource", &pattern);
                }
                vec![pattern]
            };

            for source in matches {
                let Some(file_name) = source.file_name() else {
                    continue;
                };
                let dest = resources_dir.join(file_name);
                if source.is_dir() {
                    fs::remove_path(&dest).await?;
                    fs::copy_dir(&source, &dest).await?;
                } else {
                    fs::copy_file(&source, &dest).await?;
                }
                log::debug!("Copied resource {} -> {}", source.display(), dest.display());
                installed.push(dest);
            }
        }

        Ok(installed)
    }
}

fn check_unique_names(dependencies: &[&ResolvedDependency]) -> Result<()> {
    let mut sources: HashMap<String, &Path> = HashMap::new();
    for dependency in dependencies {
        let name = dependency.name();
        match sources.get(&name) {
            Some(first) if *first != dependency.path() => {
                return Err(Error::NameCollision {
                    name,
                    first: first.to_path_buf(),
                    second: dependency.path().to_path_buf(),
                });
            }
            Some(_) => {}
            None => {
                sources.insert(name, dependency.path());
            }
        }
    }
    Ok(())
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}
