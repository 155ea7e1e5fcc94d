//! The boundary to the Xcode command line tools.
//!
//! Everything the bundler learns about or changes in a Mach-O binary goes
//! through [`BinaryTools`]. [`SystemTools`] runs the real `otool`,
//! `install_name_tool` and `codesign`; tests substitute a fake.

use super::dylib::{DependencyInspector, DependencyReference, parse_dependency_listing};
use super::sign::CodesignInvocation;
use crate::bundler::builder::tool_detection::{CODESIGN, INSTALL_NAME_TOOL, OTOOL, require};
use crate::bundler::{Error, Result};
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;

/// Inspection and rewriting of Mach-O load commands, plus code signing.
pub trait BinaryTools {
    /// Raw `otool -L` output for `binary`.
    fn list_dependencies(&self, binary: &Path) -> Result<String>;

    /// Raw `otool -l` output for `binary`.
    fn list_load_commands(&self, binary: &Path) -> Result<String>;

    /// `install_name_tool -id`.
    fn set_install_name(&self, binary: &Path, install_name: &str) -> Result<()>;

    /// `install_name_tool -change`.
    fn change_install_name(&self, binary: &Path, old: &str, new: &str) -> Result<()>;

    /// `install_name_tool -add_rpath`.
    fn add_rpath(&self, binary: &Path, rpath: &str) -> Result<()>;

    /// `codesign` on a file or bundle directory.
    fn codesign(&self, target: &Path, invocation: &CodesignInvocation) -> Result<()>;

    /// `LC_RPATH` entries of `binary`.
    fn rpaths(&self, binary: &Path) -> Result<Vec<String>> {
        parse_rpath_listing(&self.list_load_commands(binary)?)
    }
}

impl<T: BinaryTools + ?Sized> DependencyInspector for T {
    fn dependencies(&self, binary: &Path) -> Result<Vec<DependencyReference>> {
        Ok(parse_dependency_listing(&self.list_dependencies(binary)?))
    }
}

/// Extracts `LC_RPATH` paths from `otool -l` output.
///
/// ```text
/// Load command 14
///           cmd LC_RPATH
///       cmdsize 48
///          path @executable_path/../Frameworks (offset 12)
/// ```
pub fn parse_rpath_listing(output: &str) -> Result<Vec<String>> {
    let path_line = Regex::new(r"^path (.+?) \(offset \d+\)$")?;
    let mut rpaths = Vec::new();
    let mut in_rpath = false;

    for line in output.lines() {
        let line = line.trim();
        if let Some(cmd) = line.strip_prefix("cmd ") {
            in_rpath = cmd.trim() == "LC_RPATH";
            continue;
        }
        if in_rpath {
            if let Some(captures) = path_line.captures(line) {
                rpaths.push(captures[1].to_string());
                in_rpath = false;
            }
        }
    }

    Ok(rpaths)
}

/// [`BinaryTools`] backed by the tools on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTools;

impl SystemTools {
    /// Verifies the inspection and rewrite tools are installed.
    ///
    /// `codesign` is looked up lazily, only when a bundle is actually signed.
    pub fn detect() -> Result<Self> {
        require(&OTOOL, "otool")?;
        require(&INSTALL_NAME_TOOL, "install_name_tool")?;
        Ok(Self)
    }
}

impl BinaryTools for SystemTools {
    fn list_dependencies(&self, binary: &Path) -> Result<String> {
        let otool = require(&OTOOL, "otool")?;
        run(&otool, &[OsStr::new("-L"), binary.as_os_str()])
    }

    fn list_load_commands(&self, binary: &Path) -> Result<String> {
        let otool = require(&OTOOL, "otool")?;
        run(&otool, &[OsStr::new("-l"), binary.as_os_str()])
    }

    fn set_install_name(&self, binary: &Path, install_name: &str) -> Result<()> {
        let tool = require(&INSTALL_NAME_TOOL, "install_name_tool")?;
        run(
            &tool,
            &[OsStr::new("-id"), OsStr::new(install_name), binary.as_os_str()],
        )
        .map(drop)
    }

    fn change_install_name(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        let tool = require(&INSTALL_NAME_TOOL, "install_name_tool")?;
        run(
            &tool,
            &[
                OsStr::new("-change"),
                OsStr::new(old),
                OsStr::new(new),
                binary.as_os_str(),
            ],
        )
        .map(drop)
    }

    fn add_rpath(&self, binary: &Path, rpath: &str) -> Result<()> {
        let tool = require(&INSTALL_NAME_TOOL, "install_name_tool")?;
        run(
            &tool,
            &[OsStr::new("-add_rpath"), OsStr::new(rpath), binary.as_os_str()],
        )
        .map(drop)
    }

    fn codesign(&self, target: &Path, invocation: &CodesignInvocation) -> Result<()> {
        let codesign = require(&CODESIGN, "codesign")?;
        let args: Vec<OsString> = invocation.arguments(target);
        let args: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();
        run(&codesign, &args).map(drop)
    }
}

/// Runs `program` to completion and returns its stdout.
///
/// A non-zero exit becomes [`Error::ToolFailed`] carrying the full command
/// line and captured stderr.
fn run(program: &Path, args: &[&OsStr]) -> Result<String> {
    let command = command_line(program, args);
    log::debug!("Running: {}", command);

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|error| Error::CommandFailed {
            command: command.clone(),
            error,
        })?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn command_line(program: &Path, args: &[&OsStr]) -> String {
    std::iter::once(program.as_os_str())
        .chain(args.iter().copied())
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                format!("'{}'", arg)
            } else {
                arg.into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
