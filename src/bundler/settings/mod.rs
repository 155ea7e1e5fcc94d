//! Configuration structures for bundling operations.
//!
//! Per-app records decoded from `Bundler.toml`, the signing policy, target
//! platform, and the run-wide [`Settings`] built by [`SettingsBuilder`].

mod app;
mod builder;
mod core;
mod platform;
mod signing;

pub use app::AppSettings;
pub use builder::SettingsBuilder;
pub use core::{FailurePolicy, Settings};
pub use platform::{BuildConfiguration, Platform};
pub use signing::{AD_HOC_IDENTITY, HARDENED_RUNTIME, SigningPolicy};
