//! Command line interface for the app bundler.

mod args;

pub use args::Args;

use crate::bundler::{BundledApp, Bundler, FailurePolicy, SettingsBuilder, dylib::LibraryKind};
use crate::error::{CliError, Result};
use crate::metadata::BundlerConfig;

/// Runs the bundler for parsed arguments and returns the process exit code.
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config_path = args.config_path();
    let config = BundlerConfig::load(&config_path)?;

    let mut builder = SettingsBuilder::new()
        .package_dir(&args.package_dir)
        .configuration(args.configuration)
        .apps(config.into_apps())
        .select(args.apps.clone())
        .failure_policy(if args.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        });
    if let Some(output_dir) = &args.output_dir {
        builder = builder.output_dir(output_dir);
    }
    let settings = builder.build()?;
    let total = settings.apps().len();

    let bundler = Bundler::new(settings)?;
    let report = bundler.bundle().await?;

    for app in &report.bundled {
        println!("{}", summary_line(app));
    }
    for failure in &report.failures {
        eprintln!("✗ {}: {}", failure.app, failure.error);
    }

    if report.is_success() {
        Ok(0)
    } else {
        Err(CliError::BundlesFailed {
            failed: report.failures.len(),
            total,
        }
        .into())
    }
}

/// One line per finished bundle: path, embedded library counts and checksum.
pub fn summary_line(app: &BundledApp) -> String {
    format!(
        "✓ {} ({} frameworks, {} dylibs) sha256:{}",
        app.bundle.path.display(),
        app.bundle.count(LibraryKind::Framework),
        app.bundle.count(LibraryKind::Dylib),
        app.checksum
    )
}
