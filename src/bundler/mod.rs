//! Application bundler for Mach-O executables.
//!
//! Turns a cargo-built (or prebuilt) executable plus its non-system shared
//! libraries into a self-contained `.app` bundle whose load paths all point
//! inside the bundle, then optionally re-signs it.
//!
//! # Configuration
//!
//! Bundles are declared in `Bundler.toml`:
//!
//! ```toml
//! [apps.MyApp]
//! product = "myapp"
//! identifier = "com.example.myapp"
//! version = "1.0.0"
//!
//! [apps.MyApp.signing]
//! identity = "-"
//! ```
//!
//! # Integration
//!
//! ```no_run
//! use kodegen_bundler_app::bundler::{AppSettings, Bundler, SettingsBuilder};
//!
//! # async fn example() -> kodegen_bundler_app::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .package_dir(".")
//!     .app(AppSettings {
//!         product: "myapp".into(),
//!         identifier: "com.example.myapp".into(),
//!         version: "1.0.0".into(),
//!         ..AppSettings::new("MyApp")
//!     })
//!     .build()?;
//!
//! let report = Bundler::new(settings)?.bundle().await?;
//! for app in report.bundled {
//!     println!("{} ({})", app.bundle.path.display(), app.checksum);
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod error;
pub(crate) mod platform;
mod settings;
mod utils;

pub use platform::macos::dylib;

// Public re-exports
pub use builder::{BundleFailure, BundleReport, BundledApp, Bundler, checksum::calculate_sha256};
pub use error::{Error, Result};
pub use platform::macos::{
    app::{AppBundle, bundle_app},
    info_plist::{info_plist, write_info_plist},
    install_name::{InstallNameRewriter, RewriteSummary, Violation},
    layout::{BundleLayout, BundledDependency, IOS_RPATH, MACOS_RPATH},
    sign::{CodesignInvocation, SigningOutcome, sign_bundle, strip_signature_artifacts},
    tools::{BinaryTools, SystemTools, parse_rpath_listing},
};
pub use settings::{
    AD_HOC_IDENTITY, AppSettings, BuildConfiguration, FailurePolicy, HARDENED_RUNTIME, Platform,
    Settings, SettingsBuilder, SigningPolicy,
};
