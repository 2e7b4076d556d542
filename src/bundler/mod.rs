//! NSIS installer maker with electron-updater release metadata.
//!
//! This module stages a packaged Windows application, optionally signs it,
//! compiles it into an installer with `makensis`, and writes the update
//! manifests the auto-update client consumes.
//!
//! # Configuration
//!
//! The maker is configured from a TOML file or from
//! `[package.metadata.bundle.nsis]` in `Cargo.toml`:
//!
//! ```toml
//! [package.metadata.bundle.nsis.codesign]
//! certificate_file = "certs/app.pfx"
//! timestamp_server = "http://timestamp.digicert.com"
//!
//! [package.metadata.bundle.nsis.updater]
//! url = "https://downloads.example.com/myapp"
//!
//! [package.metadata.bundle.nsis.installer]
//! script = "installer/app.nsi"
//! ```
//!
//! # Outputs
//!
//! | File | Location | When |
//! |------|----------|------|
//! | `<app> Setup <version>.exe` | `<make_dir>/nsis/<arch>` | always |
//! | `app-update.yml` | inside the installed application | `updater` configured |
//! | `<channel>.yml` | next to the installer | `updater` configured |
//!
//! # Code Signing
//!
//! Authenticode signing is delegated to `kodegen_bundler_sign`. Both the
//! staged application and the produced installer are signed when `codesign`
//! is configured.

pub mod artifact;
pub mod error;
pub mod maker;
pub mod packager;
pub mod settings;
pub mod sign;
pub mod updater;
pub mod utils;

// Public re-exports
pub use artifact::ArtifactDescriptor;
pub use error::{Context, Error, ErrorExt, Result};
pub use maker::NsisMaker;
pub use packager::{MakensisPackager, PackageTarget, Packager};
pub use settings::{
    Arch, CodesignOptions, InstallerConfig, MakerNsisConfig, Settings, SettingsBuilder,
    UpdaterConfig,
};
pub use sign::{AuthenticodeSigner, Signer};
pub use updater::{ChannelManifest, Verification};
