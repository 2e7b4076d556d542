//! NSIS installer orchestration.
//!
//! [`NsisMaker`] runs the make pipeline for one architecture:
//!
//! 1. Stage a copy of the packaged application
//! 2. Sign the staged files (when `codesign` is configured)
//! 3. Write `app-update.yml` into the staged application (when `updater` is configured)
//! 4. Hand the staging directory to the [`Packager`]
//! 5. Move the produced files into `<make_dir>/nsis/<arch>`
//! 6. Write `<channel>.yml` next to the installer (when `updater` is configured)
//! 7. Remove the temporary directories
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_nsis::bundler::{NsisMaker, SettingsBuilder};
//!
//! # async fn example() -> kodegen_bundler_nsis::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .app_dir("out/MyApp-win32-x64")
//!     .make_dir("out/make")
//!     .app_name("MyApp")
//!     .app_version("1.0.0")
//!     .build()?;
//!
//! for path in NsisMaker::new(settings).make().await? {
//!     println!("Created: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::bundler::{
    artifact::{self, ArtifactDescriptor},
    error::{Error, Result},
    packager::{HAS_MAKENSIS, MakensisPackager, PackageTarget, Packager},
    settings::{Settings, UpdaterConfig},
    sign::{AuthenticodeSigner, Signer},
    updater,
    utils::fs,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maker name as registered with the packaging tool.
pub const NAME: &str = "nsis";

/// Platforms the maker is enabled for by default.
pub const DEFAULT_PLATFORMS: &[&str] = &["win32"];

/// Returns true if installers can be built on this host.
///
/// Windows always qualifies; other hosts need `makensis` on `PATH`.
pub fn is_supported_on_current_platform() -> bool {
    cfg!(windows) || *HAS_MAKENSIS
}

/// NSIS installer maker.
///
/// Generic over its signing and packaging collaborators so they can be
/// replaced, e.g. in tests.
pub struct NsisMaker<S = AuthenticodeSigner, P = MakensisPackager> {
    settings: Settings,
    signer: S,
    packager: P,
}

impl<S, P> std::fmt::Debug for NsisMaker<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NsisMaker")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl NsisMaker {
    /// Creates a maker using [`AuthenticodeSigner`] and [`MakensisPackager`].
    pub fn new(settings: Settings) -> Self {
        let packager = MakensisPackager::new(settings.config().installer.clone());
        Self::with_collaborators(settings, AuthenticodeSigner, packager)
    }
}

impl<S: Signer, P: Packager> NsisMaker<S, P> {
    /// Creates a maker with custom collaborators.
    pub fn with_collaborators(settings: Settings, signer: S, packager: P) -> Self {
        Self {
            settings,
            signer,
            packager,
        }
    }

    /// Returns the maker settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds the installer and returns every file written to the output directory.
    ///
    /// When an updater is configured the channel manifest is the last entry.
    ///
    /// # Errors
    ///
    /// - [`Error::Sign`] if signing the staged application fails
    /// - [`Error::MissingInstaller`] if the packager produced no `.exe` while
    ///   an updater is configured
    /// - [`Error::MissingVersion`] if the installer version cannot be determined
    /// - Filesystem and packager errors
    ///
    /// On error the temporary directories are left in place.
    pub async fn make(&self) -> Result<Vec<PathBuf>> {
        log::info!(
            "Making NSIS installer for {} ({})",
            self.settings.app_name(),
            self.settings.arch()
        );

        match self.run().await {
            Ok(paths) => {
                self.cleanup().await?;
                log::info!("✓ Made {} file(s) in {}", paths.len(), self.settings.out_dir().display());
                Ok(paths)
            }
            Err(e) => {
                log::warn!(
                    "NSIS make failed; temporary files left in {} and {}",
                    self.settings.staging_dir().display(),
                    self.settings.scratch_dir().display()
                );
                Err(e)
            }
        }
    }

    async fn run(&self) -> Result<Vec<PathBuf>> {
        let staging_dir = self.settings.staging_dir();
        let out_dir = self.settings.out_dir();

        self.stage(&staging_dir, &out_dir).await?;
        self.sign_staged(&staging_dir).await?;

        let update_config = self.settings.config().updater.as_ref();
        if let Some(config) = update_config {
            updater::write_update_descriptor(&staging_dir, config, self.settings.app_name())
                .await?;
        }

        let produced = self.package(&staging_dir).await?;
        let mut outputs = relocate(&produced, &out_dir).await?;

        let installer = find_installer(&outputs);
        match (update_config, installer) {
            (Some(config), Some(installer)) => {
                let channel = self.write_channel(config, &installer).await?;
                outputs.push(channel);
            }
            (Some(_), None) => {
                return Err(Error::MissingInstaller { dir: out_dir });
            }
            (None, None) => {
                log::warn!("No installer executable among the files in {}", out_dir.display());
            }
            (None, Some(_)) => {}
        }

        Ok(outputs)
    }

    async fn stage(&self, staging_dir: &Path, out_dir: &Path) -> Result<()> {
        log::debug!(
            "Staging {} into {}",
            self.settings.app_dir().display(),
            staging_dir.display()
        );
        fs::empty_dir(staging_dir).await?;
        fs::empty_dir(out_dir).await?;
        fs::copy_dir(self.settings.app_dir(), staging_dir).await
    }

    async fn sign_staged(&self, staging_dir: &Path) -> Result<()> {
        match &self.settings.config().codesign {
            Some(options) => {
                let signed = self
                    .signer
                    .sign_directory(staging_dir, options)
                    .await
                    .map_err(|e| match e {
                        Error::Sign(_) => e,
                        other => Error::Sign(other.to_string()),
                    })?;
                log::debug!("Signed {} staged file(s)", signed.len());
            }
            None => log::info!("No codesign configuration; skipping signing"),
        }
        Ok(())
    }

    async fn package(&self, staging_dir: &Path) -> Result<Vec<PathBuf>> {
        let scratch_dir = self.settings.scratch_dir();
        let target = PackageTarget {
            arch: self.settings.arch(),
            app_name: self.settings.app_name(),
            app_version: self.settings.app_version(),
            output_dir: &scratch_dir,
            signing: self.settings.config().codesign.as_ref(),
        };
        self.packager.build(staging_dir, &target).await
    }

    async fn write_channel(&self, config: &UpdaterConfig, installer: &Path) -> Result<PathBuf> {
        let artifact = ArtifactDescriptor::from_path(installer).await?;
        let version = artifact
            .version
            .clone()
            .or_else(|| self.settings.app_version().map(str::to_string))
            .ok_or_else(|| Error::MissingVersion {
                installer: installer.to_path_buf(),
            })?;

        let dir = installer.parent().unwrap_or_else(|| Path::new("."));
        updater::write_channel_descriptor(dir, config, &artifact, &version).await
    }

    async fn cleanup(&self) -> Result<()> {
        if self.settings.keep_temp() {
            log::info!("Keeping temporary files in {}", self.settings.staging_dir().display());
            return Ok(());
        }
        fs::remove_dir_all(&self.settings.staging_dir()).await?;
        fs::remove_dir_all(&self.settings.scratch_dir()).await
    }
}

/// Moves every produced file into `out_dir`, keeping its base name.
///
/// Fails before moving anything if two produced files share a base name.
async fn relocate(produced: &[PathBuf], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut names = HashSet::with_capacity(produced.len());
    for name in produced.iter().filter_map(|file| file.file_name()) {
        if !names.insert(name) {
            crate::bail!(
                "packager produced more than one file named {}",
                Path::new(name).display()
            );
        }
    }

    let mut moved = Vec::with_capacity(produced.len());
    for file in produced {
        let Some(name) = file.file_name() else {
            log::warn!("Ignoring produced path without a file name: {}", file.display());
            continue;
        };
        let dest = out_dir.join(name);
        fs::move_file(file, &dest).await?;
        moved.push(dest);
    }
    Ok(moved)
}

/// Picks the installer among `files`.
///
/// Prefers an executable named `... Setup <version>.exe`, otherwise the
/// last executable.
fn find_installer(files: &[PathBuf]) -> Option<PathBuf> {
    let executables: Vec<&PathBuf> = files
        .iter()
        .filter(|p| artifact::is_installer_executable(p))
        .collect();

    executables
        .iter()
        .find(|p| artifact::version_from_name(p).is_some())
        .or(executables.last())
        .map(|p| p.to_path_buf())
}
