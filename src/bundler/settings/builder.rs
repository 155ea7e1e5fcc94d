//! Builder for constructing Settings.

use super::{AppSettings, BuildConfiguration, FailurePolicy, Settings};
use crate::bundler::dylib::normalize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// # See Also
///
/// - [`Settings`] - The built settings struct
#[derive(Default)]
pub struct SettingsBuilder {
    package_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    configuration: BuildConfiguration,
    apps: Vec<AppSettings>,
    selected: Vec<String>,
    failure_policy: FailurePolicy,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the package root.
    ///
    /// # Required
    ///
    /// This field is required for building.
    pub fn package_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.package_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the bundle output directory.
    ///
    /// Default: `<package_dir>/target/bundle`
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the cargo build configuration.
    ///
    /// Default: release
    pub fn configuration(mut self, configuration: BuildConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Replaces the app list.
    pub fn apps(mut self, apps: Vec<AppSettings>) -> Self {
        self.apps = apps;
        self
    }

    /// Adds one app.
    pub fn app(mut self, app: AppSettings) -> Self {
        self.apps.push(app);
        self
    }

    /// Restricts bundling to the named apps, in the order given.
    ///
    /// Default: every configured app
    pub fn select(mut self, names: Vec<String>) -> Self {
        self.selected = names;
        self
    }

    /// Sets the multi-app failure policy.
    ///
    /// Default: [`FailurePolicy::Abort`]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `package_dir` is missing, no apps are configured,
    /// or a selected app name is unknown.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let package_dir = normalize(&self.package_dir.context("package_dir is required")?);
        let output_dir = match self.output_dir {
            Some(dir) if dir.is_absolute() => normalize(&dir),
            Some(dir) => normalize(&package_dir.join(dir)),
            None => package_dir.join("target").join("bundle"),
        };

        if self.apps.is_empty() {
            crate::bail!("no apps configured");
        }

        let apps = if self.selected.is_empty() {
            self.apps
        } else {
            let mut apps = Vec::with_capacity(self.selected.len());
            for name in &self.selected {
                let app = self
                    .apps
                    .iter()
                    .find(|app| &app.name == name)
                    .cloned()
                    .with_context(|| {
                        let known: Vec<&str> = self.apps.iter().map(|a| a.name.as_str()).collect();
                        format!("unknown app '{}', configured apps: {}", name, known.join(", "))
                    })?;
                apps.push(app);
            }
            apps
        };

        Ok(Settings::new(
            package_dir,
            output_dir,
            self.configuration,
            apps,
            self.failure_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_defaults_below_package() {
        let settings = SettingsBuilder::new()
            .package_dir("/work/pkg")
            .app(AppSettings::new("Demo"))
            .build()
            .unwrap();
        assert_eq!(settings.output_dir(), Path::new("/work/pkg/target/bundle"));
        assert_eq!(settings.configuration(), BuildConfiguration::Release);
    }

    #[test]
    fn test_relative_output_dir_is_resolved() {
        let settings = SettingsBuilder::new()
            .package_dir("/work/pkg")
            .output_dir("out/../dist")
            .app(AppSettings::new("Demo"))
            .build()
            .unwrap();
        assert_eq!(settings.output_dir(), Path::new("/work/pkg/dist"));
    }

    #[test]
    fn test_select_filters_and_orders() {
        let settings = SettingsBuilder::new()
            .package_dir("/work/pkg")
            .apps(vec![AppSettings::new("A"), AppSettings::new("B"), AppSettings::new("C")])
            .select(vec!["C".into(), "A".into()])
            .build()
            .unwrap();
        let names: Vec<&str> = settings.apps().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
    }

    #[test]
    fn test_unknown_selection_fails() {
        let result = SettingsBuilder::new()
            .package_dir("/work/pkg")
            .app(AppSettings::new("A"))
            .select(vec!["Nope".into()])
            .build();
        assert!(result.unwrap_err().to_string().contains("unknown app 'Nope'"));
    }
}
