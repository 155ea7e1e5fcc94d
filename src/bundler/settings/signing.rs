//! Code signing policy for an app bundle.

use std::path::PathBuf;

/// Identity meaning "sign ad-hoc, without a certificate".
pub const AD_HOC_IDENTITY: &str = "-";

/// `codesign --options` flag enabling the hardened runtime.
pub const HARDENED_RUNTIME: &str = "runtime";

/// How an app bundle and its embedded libraries are signed.
///
/// The same policy is applied to every copied framework and dylib and then
/// to the bundle itself.
///
/// # Configuration
///
/// ```toml
/// [apps.MyApp.signing]
/// identity = "Developer ID Application: Your Name (TEAMID)"
/// entitlements = "MyApp.entitlements"
/// deep = false
/// ```
///
/// Use `identity = "-"` for ad-hoc signing (development only). Ad-hoc
/// signatures cannot carry the hardened runtime, so `runtime` is only added
/// by default for real identities.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningPolicy {
    /// Whether to sign at all.
    ///
    /// Default: true when a `[signing]` table is present
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Code signing identity name, or `-` for ad-hoc.
    ///
    /// Default: None (signing skipped with a warning)
    #[serde(default)]
    pub identity: Option<String>,

    /// Path to an entitlements plist, relative to the package directory.
    #[serde(default)]
    pub entitlements: Option<PathBuf>,

    /// Explicit `codesign --options` flags (e.g. `["runtime"]`).
    ///
    /// Default: None (`runtime` for real identities, nothing for ad-hoc)
    #[serde(default)]
    pub options: Option<Vec<String>>,

    /// Pass `--deep` to codesign.
    #[serde(default)]
    pub deep: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl SigningPolicy {
    /// Returns the identity if one is configured and non-blank.
    pub fn identity(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .map(str::trim)
            .filter(|identity| !identity.is_empty())
    }

    /// Returns true for the ad-hoc placeholder identity.
    pub fn is_ad_hoc(&self) -> bool {
        self.identity() == Some(AD_HOC_IDENTITY)
    }

    /// Option flags actually passed to codesign.
    pub fn effective_options(&self) -> Vec<String> {
        match &self.options {
            Some(options) => options.clone(),
            None if self.is_ad_hoc() => Vec::new(),
            None => vec![HARDENED_RUNTIME.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(identity: &str, options: Option<Vec<&str>>) -> SigningPolicy {
        SigningPolicy {
            enabled: true,
            identity: Some(identity.to_string()),
            options: options.map(|o| o.into_iter().map(String::from).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_ad_hoc_omits_hardened_runtime() {
        assert!(policy("-", None).effective_options().is_empty());
    }

    #[test]
    fn test_real_identity_defaults_to_hardened_runtime() {
        assert_eq!(
            policy("Developer ID Application: Example (TEAMID)", None).effective_options(),
            vec!["runtime"]
        );
    }

    #[test]
    fn test_explicit_options_win() {
        assert_eq!(
            policy("-", Some(vec!["runtime", "library"])).effective_options(),
            vec!["runtime", "library"]
        );
        assert!(policy("Developer ID", Some(vec![])).effective_options().is_empty());
    }

    #[test]
    fn test_blank_identity_is_none() {
        assert_eq!(policy("   ", None).identity(), None);
    }
}
