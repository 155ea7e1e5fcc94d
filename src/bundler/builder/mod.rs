//! Bundle orchestration and coordination.
//!
//! This module provides the main [`Bundler`] orchestrator that turns
//! [`Settings`](crate::bundler::Settings) into finished app bundles.
//!
//! # Overview
//!
//! For every selected app the bundler:
//! 1. Builds the product with cargo, or takes the prebuilt binary
//! 2. Delegates assembly to the platform module
//! 3. Calculates the bundle checksum
//! 4. Returns a [`BundledApp`] in the [`BundleReport`]
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-256 over a bundle tree
//! - [`orchestrator`] - Main [`Bundler`] struct and failure policy
//! - [`product`] - Cargo build step
//! - [`tool_detection`] - External tool availability checking

pub mod checksum;
mod orchestrator;
pub mod product;
pub mod tool_detection;

pub use orchestrator::{BundleFailure, BundleReport, BundledApp, Bundler};
