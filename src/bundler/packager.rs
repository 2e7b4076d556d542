//! NSIS packaging collaborator.
//!
//! The maker hands the staged application to a [`Packager`] and gets back
//! the list of files it produced. [`MakensisPackager`] compiles a
//! user-supplied NSIS script with `makensis`; script authoring is left to
//! the application.

use crate::bundler::{
    artifact,
    error::{Error, Result},
    settings::{Arch, CodesignOptions, InstallerConfig},
    sign::{AuthenticodeSigner, Signer},
    utils::fs,
};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Check if makensis is available for NSIS installer creation.
///
/// Cached result to avoid repeated subprocess calls.
pub static HAS_MAKENSIS: LazyLock<bool> = LazyLock::new(|| match which::which("makensis") {
    Ok(path) => match std::process::Command::new(&path).arg("-VERSION").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            log::debug!("makensis available at {}: {}", path.display(), version.trim());
            true
        }
        Ok(output) => {
            log::warn!(
                "makensis found at {} but -VERSION check failed (exit code: {:?}). Stderr: {}",
                path.display(),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
            false
        }
        Err(e) => {
            log::warn!(
                "makensis found at {} but failed to execute: {}. Check file permissions.",
                path.display(),
                e
            );
            false
        }
    },
    Err(e) => {
        log::debug!("makensis not found in PATH: {}", e);
        false
    }
});

/// What the packager is asked to build.
///
/// Signing options travel here explicitly so the packager can sign the
/// installer it produces.
#[derive(Debug, Clone, Copy)]
pub struct PackageTarget<'a> {
    /// Installer architecture.
    pub arch: Arch,
    /// Application name.
    pub app_name: &'a str,
    /// Application version, when known.
    pub app_version: Option<&'a str>,
    /// Scratch directory the packager writes its output into.
    pub output_dir: &'a Path,
    /// Signing options for produced executables.
    pub signing: Option<&'a CodesignOptions>,
}

impl PackageTarget<'_> {
    /// Target identifier in `<format>:<arch>` notation, e.g. `nsis:x64`.
    pub fn spec(&self) -> String {
        format!("nsis:{}", self.arch)
    }

    /// Installer file name: `<app_name> Setup <version>.exe`.
    pub fn installer_file_name(&self) -> String {
        match self.app_version {
            Some(version) => format!("{} Setup {}.exe", self.app_name, version),
            None => format!("{} Setup.exe", self.app_name),
        }
    }
}

/// Packaging collaborator.
#[allow(async_fn_in_trait)]
pub trait Packager {
    /// Builds installers from `source_dir`, returning every produced file.
    async fn build(&self, source_dir: &Path, target: &PackageTarget<'_>) -> Result<Vec<PathBuf>>;
}

/// Compiles an NSIS script with `makensis`.
#[derive(Debug, Clone)]
pub struct MakensisPackager<S = AuthenticodeSigner> {
    installer: InstallerConfig,
    signer: S,
}

impl MakensisPackager {
    /// Creates a packager signing its output with [`AuthenticodeSigner`].
    pub fn new(installer: InstallerConfig) -> Self {
        Self::with_signer(installer, AuthenticodeSigner)
    }
}

impl<S: Signer> MakensisPackager<S> {
    /// Creates a packager with a custom signer.
    pub fn with_signer(installer: InstallerConfig, signer: S) -> Self {
        Self { installer, signer }
    }

    fn makensis(&self) -> Result<PathBuf> {
        if let Some(path) = &self.installer.makensis {
            return Ok(path.clone());
        }
        which::which("makensis").map_err(|_| Error::ToolNotFound {
            tool: "makensis".into(),
            hint: "install NSIS 3.x (e.g. apt-get install nsis) or set installer.makensis".into(),
        })
    }

    /// Builds the makensis command line for `script`.
    ///
    /// Built-in defines come first so configured defines can override them.
    pub fn makensis_args(
        &self,
        script: &Path,
        source_dir: &Path,
        target: &PackageTarget<'_>,
    ) -> Vec<String> {
        let outfile = target.output_dir.join(target.installer_file_name());
        let mut args = vec![
            "-V2".to_string(),
            format!("-DAPP_DIR={}", source_dir.display()),
            format!("-DAPP_NAME={}", target.app_name),
            format!("-DARCH={}", target.arch),
            format!("-DOUTPUT_DIR={}", target.output_dir.display()),
            format!("-DOUTFILE={}", outfile.display()),
        ];
        if let Some(version) = target.app_version {
            args.push(format!("-DVERSION={}", version));
        }
        args.extend(
            self.installer
                .defines
                .iter()
                .map(|(key, value)| format!("-D{}={}", key, value)),
        );
        args.push(script.display().to_string());
        args
    }
}

impl<S: Signer> Packager for MakensisPackager<S> {
    async fn build(&self, source_dir: &Path, target: &PackageTarget<'_>) -> Result<Vec<PathBuf>> {
        let script = self.installer.script.as_deref().ok_or_else(|| {
            Error::GenericError(
                "installer.script is not configured; point it at the NSIS script to compile".into(),
            )
        })?;
        if !script.is_file() {
            return Err(Error::GenericError(format!(
                "NSIS script {} does not exist",
                script.display()
            )));
        }

        let makensis = self.makensis()?;
        fs::empty_dir(target.output_dir).await?;

        let args = self.makensis_args(script, source_dir, target);
        log::info!("Building {} with {}", target.spec(), makensis.display());
        log::debug!("makensis arguments: {:?}", args);

        let output = tokio::process::Command::new(&makensis)
            .args(&args)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: makensis.display().to_string(),
                error,
            })?;

        if !output.status.success() {
            return Err(Error::GenericError(format!(
                "makensis failed with exit code {:?}:\n{}{}",
                output.status.code(),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let produced = fs::list_files(target.output_dir).await?;
        if let Some(options) = target.signing {
            for file in produced.iter().filter(|p| artifact::is_installer_executable(p)) {
                self.signer.sign_file(file, options).await?;
            }
        }

        log::info!("✓ makensis produced {} file(s)", produced.len());
        Ok(produced)
    }
}
