//! Apple application bundle assembly.
//!
//! One `.app` is produced per configured app, strictly in this order:
//!
//! 1. [`dylib`] discovers the executable's non-system library closure
//! 2. [`layout`] creates the bundle skeleton and copies every binary into it
//! 3. [`install_name`] rewrites install names and load paths to `@rpath`
//! 4. [`sign`] re-signs the embedded libraries bottom-up, then the bundle
//!
//! All binary inspection and modification goes through [`tools::BinaryTools`].
//!
//! # Build Requirements
//!
//! | Step | Required Tools | Notes |
//! |------|----------------|-------|
//! | Discovery | `otool` | Xcode Command Line Tools |
//! | Rewriting | `install_name_tool` | Xcode Command Line Tools |
//! | Code Signing | `codesign` | Optional; only when an identity is configured |

pub mod app;
pub mod dylib;
pub mod info_plist;
pub mod install_name;
pub mod layout;
pub mod sign;
pub mod tools;
