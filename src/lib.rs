//! # kodegen_bundler_nsis
//!
//! NSIS installer maker for packaged Windows desktop applications.
//!
//! This crate stages a packaged application, optionally Authenticode-signs
//! it, compiles an installer with `makensis` and writes the
//! electron-updater release metadata next to it.
//!
//! ## Features
//!
//! - **Streamed hashing**: base64 SHA-512 of installers of any size
//! - **Update metadata**: `app-update.yml` inside the app, `<channel>.yml` next to the installer
//! - **Code signing**: Authenticode via `kodegen_bundler_sign`
//! - **Verification**: re-check a published channel manifest against its installer
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_nsis make --dir out/MyApp-win32-x64 --out-dir out/make --name MyApp --app-version 1.0.0
//! kodegen_bundler_nsis verify out/make/nsis/x64/latest.yml
//! kodegen_bundler_nsis hash "out/make/nsis/x64/MyApp Setup 1.0.0.exe"
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;

// Re-export main types for public API
pub use bundler::{ArtifactDescriptor, NsisMaker, Settings, SettingsBuilder};
pub use cli::Args;
pub use error::{CliError, ConfigError, MakerError, Result};
