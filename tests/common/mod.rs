//! Shared fixtures for integration tests.
//!
//! Binaries are plain text files describing their own load commands:
//!
//! ```text
//! id @rpath/libfoo.dylib
//! dep /opt/local/lib/libbar.dylib
//! rpath @executable_path/../Frameworks
//! ```
//!
//! [`FakeTools`] serves `otool`-format listings from those files and applies
//! `install_name_tool` edits to them in place, so copies carry their state
//! exactly like real Mach-O files would.

#![allow(dead_code)]

use kodegen_bundler_app::bundler::{
    AppSettings, BinaryTools, CodesignInvocation, Error, Result, Settings, SettingsBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A call made through [`BinaryTools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetId { binary: PathBuf, name: String },
    Change { binary: PathBuf, old: String, new: String },
    AddRpath { binary: PathBuf, rpath: String },
    Codesign {
        target: PathBuf,
        args: Vec<String>,
        /// Whether `_CodeSignature` or `CodeResources` existed below the target.
        had_signature_artifacts: bool,
    },
}

/// In-memory stand-in for otool, install_name_tool and codesign.
#[derive(Debug, Default)]
pub struct FakeTools {
    calls: Mutex<Vec<Call>>,
    inspected: Mutex<Vec<PathBuf>>,
    fail_codesign: bool,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake whose codesign always exits non-zero.
    pub fn failing_codesign() -> Self {
        Self {
            fail_codesign: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Binaries listed with `otool -L`, in call order.
    pub fn inspected(&self) -> Vec<PathBuf> {
        self.inspected.lock().unwrap().clone()
    }

    pub fn codesign_targets(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Codesign { target, .. } => Some(target),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Load commands of a fake binary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FakeBinary {
    pub id: Option<String>,
    pub deps: Vec<String>,
    pub rpaths: Vec<String>,
}

impl FakeBinary {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut binary = Self::default();
        for line in text.lines() {
            if let Some(id) = line.strip_prefix("id ") {
                binary.id = Some(id.to_string());
            } else if let Some(dep) = line.strip_prefix("dep ") {
                binary.deps.push(dep.to_string());
            } else if let Some(rpath) = line.strip_prefix("rpath ") {
                binary.rpaths.push(rpath.to_string());
            }
        }
        Ok(binary)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = String::new();
        if let Some(id) = &self.id {
            text.push_str(&format!("id {id}\n"));
        }
        for dep in &self.deps {
            text.push_str(&format!("dep {dep}\n"));
        }
        for rpath in &self.rpaths {
            text.push_str(&format!("rpath {rpath}\n"));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl BinaryTools for FakeTools {
    fn list_dependencies(&self, binary: &Path) -> Result<String> {
        self.inspected.lock().unwrap().push(binary.to_path_buf());
        let fake = FakeBinary::read(binary)?;
        let mut out = format!("{}:\n", binary.display());
        for load_path in fake.id.iter().chain(fake.deps.iter()) {
            out.push_str(&format!(
                "\t{load_path} (compatibility version 1.0.0, current version 1.0.0)\n"
            ));
        }
        Ok(out)
    }

    fn list_load_commands(&self, binary: &Path) -> Result<String> {
        let fake = FakeBinary::read(binary)?;
        let mut out = format!("{}:\n", binary.display());
        for (index, rpath) in fake.rpaths.iter().enumerate() {
            out.push_str(&format!(
                "Load command {}\n          cmd LC_RPATH\n      cmdsize 48\n         path {} (offset 12)\n",
                index + 20,
                rpath
            ));
        }
        Ok(out)
    }

    fn set_install_name(&self, binary: &Path, install_name: &str) -> Result<()> {
        let mut fake = FakeBinary::read(binary)?;
        fake.id = Some(install_name.to_string());
        fake.write(binary)?;
        self.record(Call::SetId {
            binary: binary.to_path_buf(),
            name: install_name.to_string(),
        });
        Ok(())
    }

    fn change_install_name(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        let mut fake = FakeBinary::read(binary)?;
        for dep in &mut fake.deps {
            if dep == old {
                *dep = new.to_string();
            }
        }
        fake.write(binary)?;
        self.record(Call::Change {
            binary: binary.to_path_buf(),
            old: old.to_string(),
            new: new.to_string(),
        });
        Ok(())
    }

    fn add_rpath(&self, binary: &Path, rpath: &str) -> Result<()> {
        let mut fake = FakeBinary::read(binary)?;
        fake.rpaths.push(rpath.to_string());
        fake.write(binary)?;
        self.record(Call::AddRpath {
            binary: binary.to_path_buf(),
            rpath: rpath.to_string(),
        });
        Ok(())
    }

    fn codesign(&self, target: &Path, invocation: &CodesignInvocation) -> Result<()> {
        let had_signature_artifacts = walkdir::WalkDir::new(target)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name() == "_CodeSignature" || entry.file_name() == "CodeResources");
        let args = invocation
            .arguments(target)
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.record(Call::Codesign {
            target: target.to_path_buf(),
            args,
            had_signature_artifacts,
        });
        if self.fail_codesign {
            return Err(Error::ToolFailed {
                command: format!("codesign {}", target.display()),
                status: "exit status: 1".to_string(),
                stderr: "no identity found".to_string(),
            });
        }
        Ok(())
    }
}

/// Writes an executable with the given dependencies.
pub fn executable(path: &Path, deps: &[&str]) -> PathBuf {
    FakeBinary {
        id: None,
        deps: deps.iter().map(|d| d.to_string()).collect(),
        rpaths: Vec::new(),
    }
    .write(path)
    .unwrap();
    path.to_path_buf()
}

/// Writes `<dir>/<file>` as a dylib whose id is its own absolute path.
pub fn dylib(dir: &Path, file: &str, deps: &[&str]) -> PathBuf {
    let path = dir.join(file);
    FakeBinary {
        id: Some(path.to_string_lossy().into_owned()),
        deps: deps.iter().map(|d| d.to_string()).collect(),
        rpaths: Vec::new(),
    }
    .write(&path)
    .unwrap();
    path
}

/// Writes a versioned `<dir>/<name>.framework` with `Versions/Current` and top-level symlinks.
pub fn framework(dir: &Path, name: &str, deps: &[&str]) -> PathBuf {
    let root = dir.join(format!("{name}.framework"));
    let binary = root.join("Versions/A").join(name);
    FakeBinary {
        id: Some(format!("@rpath/{name}.framework/Versions/A/{name}")),
        deps: deps.iter().map(|d| d.to_string()).collect(),
        rpaths: Vec::new(),
    }
    .write(&binary)
    .unwrap();
    std::fs::create_dir_all(root.join("Versions/A/Resources")).unwrap();
    std::fs::write(root.join("Versions/A/Resources/Info.plist"), b"<plist/>").unwrap();
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink("A", root.join("Versions/Current")).unwrap();
        std::os::unix::fs::symlink(format!("Versions/Current/{name}"), root.join(name)).unwrap();
    }
    root
}

/// Minimal valid settings for an app using a prebuilt binary.
pub fn app(name: &str, binary: &Path) -> AppSettings {
    AppSettings {
        identifier: format!("com.example.{}", name.to_lowercase()),
        version: "1.0.0".into(),
        binary: Some(binary.to_path_buf()),
        ..AppSettings::new(name)
    }
}

pub fn settings(package_dir: &Path, apps: Vec<AppSettings>) -> Settings {
    SettingsBuilder::new()
        .package_dir(package_dir)
        .output_dir(package_dir.join("dist"))
        .apps(apps)
        .build()
        .unwrap()
}
