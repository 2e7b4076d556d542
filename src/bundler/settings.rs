//! Configuration structures for NSIS installer making.
//!
//! This module provides the plugin configuration (code signing, auto-update
//! metadata, makensis invocation), the target architecture and the
//! [`Settings`] consumed by [`NsisMaker`](crate::bundler::NsisMaker), built
//! with [`SettingsBuilder`].

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default update channel when none is configured.
pub const DEFAULT_CHANNEL: &str = "latest";

/// File extensions signed in the staged application by default.
pub const DEFAULT_SIGN_EXTENSIONS: &[&str] = &["exe", "dll", "node"];

/// Target CPU architecture of the installer.
///
/// Uses the electron naming scheme since the output layout
/// (`nsis/<arch>`) and the update client both expect it.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_nsis::bundler::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch, Arch::Arm64);
/// assert_eq!(Arch::from_target_triple("x86_64-pc-windows-msvc"), Some(Arch::X64));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    #[default]
    X64,
    /// x86 / i686 (32-bit)
    Ia32,
    /// AArch64 / ARM64 (64-bit)
    Arm64,
}

impl Arch {
    /// Returns the short name used in directory names and makensis defines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Ia32 => "ia32",
            Arch::Arm64 => "arm64",
        }
    }

    /// Detects the architecture from a Rust target triple.
    ///
    /// Returns `None` for architectures NSIS installers are not built for.
    pub fn from_target_triple(target: &str) -> Option<Self> {
        if target.starts_with("x86_64") {
            Some(Arch::X64)
        } else if target.starts_with("i686") || target.starts_with("i586") {
            Some(Arch::Ia32)
        } else if target.starts_with("aarch64") {
            Some(Arch::Arm64)
        } else {
            None
        }
    }

    /// Architecture of the running host, falling back to x64.
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "x86" => Arch::Ia32,
            "aarch64" => Arch::Arm64,
            _ => Arch::X64,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = crate::bundler::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Ok(Arch::X64),
            "ia32" | "x86" | "i686" => Ok(Arch::Ia32),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            other => Err(crate::bundler::Error::ArchError(other.to_string())),
        }
    }
}

/// Authenticode signing options.
///
/// Credentials travel inside this struct to every collaborator that needs
/// them; nothing is read from or written to the process environment.
///
/// # Configuration
///
/// ```toml
/// [codesign]
/// certificate_file = "certs/app.pfx"
/// timestamp_server = "http://timestamp.digicert.com"
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodesignOptions {
    /// Path to the PKCS#12 (.pfx / .p12) certificate.
    #[serde(alias = "certificateFile")]
    pub certificate_file: PathBuf,

    /// Password for the certificate file.
    ///
    /// Default: None (unencrypted certificate)
    #[serde(alias = "certificatePassword")]
    pub certificate_password: Option<String>,

    /// RFC 3161 timestamp server URL.
    ///
    /// Default: None (signature is not timestamped)
    #[serde(alias = "timestampServer")]
    pub timestamp_server: Option<String>,

    /// Description embedded in the signature.
    pub description: Option<String>,

    /// URL embedded in the signature.
    pub website: Option<String>,

    /// Separate private key file, for PEM certificates.
    ///
    /// Default: None (key is inside the certificate file)
    #[serde(alias = "keyFile")]
    pub key_file: Option<PathBuf>,

    /// File extensions to sign inside the staged application.
    ///
    /// Default: empty, meaning [`DEFAULT_SIGN_EXTENSIONS`]
    pub extensions: Vec<String>,
}

impl CodesignOptions {
    /// Returns true if the file at `path` should be signed.
    pub fn should_sign(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };

        if self.extensions.is_empty() {
            DEFAULT_SIGN_EXTENSIONS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        } else {
            self.extensions
                .iter()
                .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
        }
    }
}

impl fmt::Debug for CodesignOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodesignOptions")
            .field("certificate_file", &self.certificate_file)
            .field(
                "certificate_password",
                &self.certificate_password.as_ref().map(|_| "<redacted>"),
            )
            .field("timestamp_server", &self.timestamp_server)
            .field("description", &self.description)
            .field("website", &self.website)
            .field("key_file", &self.key_file)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Auto-update configuration (electron-updater "generic" provider).
///
/// When absent, neither `app-update.yml` nor `<channel>.yml` is produced.
///
/// # Configuration
///
/// ```toml
/// [updater]
/// url = "https://downloads.example.com/myapp"
/// channel = "beta"
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct UpdaterConfig {
    /// Base URL the update client polls for `<channel>.yml`.
    pub url: String,

    /// Update channel.
    ///
    /// Default: None (uses [`DEFAULT_CHANNEL`])
    #[serde(default)]
    pub channel: Option<String>,

    /// Directory name under the user cache used by the update client.
    ///
    /// Default: None (uses `<lowercased app name>-updater`)
    #[serde(default, alias = "updaterCacheDirName")]
    pub updater_cache_dir_name: Option<String>,

    /// Publisher name(s) the update client expects on the installer signature.
    #[serde(default, alias = "publisherName")]
    pub publisher_name: Option<String>,
}

impl UpdaterConfig {
    /// Creates an updater configuration with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Returns the configured channel or [`DEFAULT_CHANNEL`].
    pub fn channel(&self) -> &str {
        self.channel
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CHANNEL)
    }

    /// Returns the configured cache directory or `<lowercased app name>-updater`.
    pub fn cache_dir_name(&self, app_name: &str) -> String {
        match self.updater_cache_dir_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{}-updater", app_name.to_lowercase()),
        }
    }

    /// File name of the channel manifest, e.g. `latest.yml`.
    pub fn channel_file_name(&self) -> String {
        format!("{}.yml", self.channel())
    }
}

/// makensis invocation settings.
///
/// # Configuration
///
/// ```toml
/// [installer]
/// script = "installer/app.nsi"
///
/// [installer.defines]
/// PUBLISHER = "Example Inc."
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// NSIS script compiled by makensis.
    pub script: Option<PathBuf>,

    /// Explicit path to the makensis binary.
    ///
    /// Default: None (looked up on `PATH`)
    pub makensis: Option<PathBuf>,

    /// Additional `/D` defines passed to makensis.
    pub defines: BTreeMap<String, String>,
}

/// Complete plugin configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MakerNsisConfig {
    /// Code signing; signing is skipped when absent.
    pub codesign: Option<CodesignOptions>,

    /// Auto-update metadata; no manifests are written when absent.
    pub updater: Option<UpdaterConfig>,

    /// makensis invocation.
    pub installer: InstallerConfig,
}

/// Settings for one installer build.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Packaged application directory (input).
    app_dir: PathBuf,

    /// Root of the make output; installers land in `<make_dir>/nsis/<arch>`.
    make_dir: PathBuf,

    /// Application name.
    app_name: String,

    /// Application version; fallback when the installer name carries none.
    app_version: Option<String>,

    /// Target architecture.
    arch: Arch,

    /// Plugin configuration.
    config: MakerNsisConfig,

    /// Leave staging directories in place after a successful build.
    keep_temp: bool,
}

impl Settings {
    /// Returns the application directory that gets staged.
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Returns the make output root.
    pub fn make_dir(&self) -> &Path {
        &self.make_dir
    }

    /// Returns the application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns the configured application version.
    pub fn app_version(&self) -> Option<&str> {
        self.app_version.as_deref()
    }

    /// Returns the target architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Returns the plugin configuration.
    pub fn config(&self) -> &MakerNsisConfig {
        &self.config
    }

    /// Returns true if staging directories survive a successful build.
    pub fn keep_temp(&self) -> bool {
        self.keep_temp
    }

    /// Final output directory: `<make_dir>/nsis/<arch>`.
    pub fn out_dir(&self) -> PathBuf {
        self.make_dir.join("nsis").join(self.arch.as_str())
    }

    /// Staging directory: `<make_dir>/nsis/<arch>-tmp`.
    pub fn staging_dir(&self) -> PathBuf {
        self.make_dir
            .join("nsis")
            .join(format!("{}-tmp", self.arch.as_str()))
    }

    /// Scratch directory the packager writes into: `<make_dir>/nsis/make`.
    pub fn scratch_dir(&self) -> PathBuf {
        self.make_dir.join("nsis").join("make")
    }
}

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_nsis::bundler::{Arch, SettingsBuilder};
///
/// # fn example() -> kodegen_bundler_nsis::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .app_dir("out/MyApp-win32-x64")
///     .make_dir("out/make")
///     .app_name("MyApp")
///     .app_version("1.0.0")
///     .arch(Arch::X64)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    app_dir: Option<PathBuf>,
    make_dir: Option<PathBuf>,
    app_name: Option<String>,
    app_version: Option<String>,
    arch: Option<Arch>,
    config: MakerNsisConfig,
    keep_temp: bool,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the application directory. Required.
    pub fn app_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.app_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the make output root. Required.
    pub fn make_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.make_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the application name. Required.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Sets the application version.
    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    /// Sets the target architecture.
    ///
    /// Default: `TARGET` environment variable if it names a supported
    /// triple, otherwise the host architecture.
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Sets the plugin configuration.
    pub fn config(mut self, config: MakerNsisConfig) -> Self {
        self.config = config;
        self
    }

    /// Keeps staging directories after a successful build.
    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `app_dir`, `make_dir` or `app_name` is missing,
    /// or if the app name is empty.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::Context;

        let arch = self.arch.unwrap_or_else(|| {
            std::env::var("TARGET")
                .ok()
                .and_then(|t| Arch::from_target_triple(&t))
                .unwrap_or_else(Arch::host)
        });

        let app_name = self.app_name.context("app_name is required")?;
        if app_name.trim().is_empty() {
            crate::bail!("app_name must not be empty");
        }

        Ok(Settings {
            app_dir: self.app_dir.context("app_dir is required")?,
            make_dir: self.make_dir.context("make_dir is required")?,
            app_name,
            app_version: self.app_version.filter(|v| !v.is_empty()),
            arch,
            config: self.config,
            keep_temp: self.keep_temp,
        })
    }
}
