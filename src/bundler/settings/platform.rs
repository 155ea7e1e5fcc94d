//! Target platform and build configuration types.

use std::fmt;
use std::str::FromStr;

/// Apple platform an app bundle is assembled for.
///
/// Determines the bundle's directory layout and the runtime search path
/// written into the executable.
///
/// # Configuration
///
/// ```toml
/// [apps.MyApp]
/// platform = "macOS"
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, serde::Deserialize)]
pub enum Platform {
    /// macOS - `Contents/MacOS`, `Contents/Frameworks`, `Contents/Resources`
    #[default]
    #[serde(rename = "macOS", alias = "macos")]
    MacOs,
    /// iOS / iPadOS - flat bundle with a `Frameworks` directory
    #[serde(rename = "iOS", alias = "ios")]
    Ios,
    /// tvOS - same layout as iOS
    #[serde(rename = "tvOS", alias = "tvos")]
    TvOs,
    /// visionOS - same layout as iOS
    #[serde(rename = "visionOS", alias = "visionos")]
    VisionOs,
}

impl Platform {
    /// Returns true for the desktop layout with a `Contents` directory.
    pub fn is_macos(self) -> bool {
        self == Self::MacOs
    }

    /// Value used for `CFBundleSupportedPlatforms` in Info.plist.
    pub fn supported_platform(self) -> &'static str {
        match self {
            Self::MacOs => "MacOSX",
            Self::Ios => "iPhoneOS",
            Self::TvOs => "AppleTVOS",
            Self::VisionOs => "XROS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MacOs => "macOS",
            Self::Ios => "iOS",
            Self::TvOs => "tvOS",
            Self::VisionOs => "visionOS",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "macos" => Ok(Self::MacOs),
            "ios" => Ok(Self::Ios),
            "tvos" => Ok(Self::TvOs),
            "visionos" => Ok(Self::VisionOs),
            other => Err(format!(
                "unknown platform '{}', expected one of: macOS, iOS, tvOS, visionOS",
                other
            )),
        }
    }
}

/// Cargo profile the product is built with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum BuildConfiguration {
    /// `cargo build` into `target/debug`
    Debug,
    /// `cargo build --release` into `target/release`
    #[default]
    Release,
}

impl BuildConfiguration {
    /// Profile directory name below the cargo target directory.
    pub fn profile_dir(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile_dir())
    }
}
