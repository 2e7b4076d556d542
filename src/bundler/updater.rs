//! electron-updater compatible release metadata.
//!
//! Two documents are produced:
//!
//! - `app-update.yml`, placed _into_ the packaged application, tells the
//!   update client where to look for updates;
//! - `<channel>.yml`, placed _next to_ the installer, describes the latest
//!   installer on that channel.
//!
//! Both have a fixed schema and are rendered from handlebars templates. The
//! channel manifest can also be read back and checked against its installer
//! with [`verify_channel_manifest`].

use crate::bundler::{
    artifact::{self, ArtifactDescriptor},
    error::{Context, ErrorExt, Result},
    settings::UpdaterConfig,
};
use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the update descriptor bundled with the application.
pub const APP_UPDATE_FILE_NAME: &str = "app-update.yml";

const UPDATE_DESCRIPTOR_TEMPLATE: &str = "provider: generic
url: '{{url}}'
channel: {{channel}}
updaterCacheDirName: {{cache_dir_name}}
";

const CHANNEL_DESCRIPTOR_TEMPLATE: &str = "version: {{version}}
files:
  - url: {{file_name}}
    sha512: {{sha512}}
    size: {{size}}
path: {{file_name}}
sha512: {{sha512}}
releaseDate: '{{release_date}}'
";

#[derive(Serialize)]
struct UpdateDescriptorData {
    url: String,
    channel: String,
    cache_dir_name: String,
}

#[derive(Serialize)]
struct ChannelDescriptorData {
    version: String,
    file_name: String,
    sha512: String,
    size: u64,
    release_date: String,
}

/// A parsed `<channel>.yml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelManifest {
    /// Released version.
    pub version: String,
    /// Downloadable files; the NSIS maker writes exactly one.
    pub files: Vec<ChannelFile>,
    /// Installer file name.
    pub path: String,
    /// Base64 SHA-512 of the installer.
    pub sha512: String,
    /// ISO-8601 generation timestamp.
    pub release_date: String,
}

/// One entry of [`ChannelManifest::files`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChannelFile {
    /// File name relative to the update URL.
    pub url: String,
    /// Base64 SHA-512 of the file.
    pub sha512: String,
    /// Size in bytes.
    pub size: u64,
}

/// Outcome of checking a channel manifest against its installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Installer the manifest points at.
    pub installer: PathBuf,
    /// Digest recorded in the manifest.
    pub expected_sha512: String,
    /// Digest of the installer on disk.
    pub actual_sha512: String,
    /// Size recorded in the manifest.
    pub expected_size: u64,
    /// Size of the installer on disk.
    pub actual_size: u64,
}

impl Verification {
    /// True when both hash and size match.
    pub fn is_valid(&self) -> bool {
        self.expected_sha512 == self.actual_sha512 && self.expected_size == self.actual_size
    }
}

fn registry() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);
    handlebars.register_template_string("app-update", UPDATE_DESCRIPTOR_TEMPLATE)?;
    handlebars.register_template_string("channel", CHANNEL_DESCRIPTOR_TEMPLATE)?;
    Ok(handlebars)
}

/// Escapes a value for use inside a single-quoted YAML scalar.
fn single_quoted(value: &str) -> String {
    value.replace('\'', "''")
}

/// Renders `value` as a YAML scalar that reads back as the same string.
///
/// Plain when YAML would parse it unchanged, single-quoted otherwise (e.g.
/// `#`, `: `, leading indicators, or values that would parse as numbers,
/// booleans or null).
fn yaml_scalar(value: &str) -> String {
    let plain = !value.contains(['\n', '\r', '\t'])
        && matches!(
            serde_yaml::from_str::<serde_yaml::Value>(value),
            Ok(serde_yaml::Value::String(parsed)) if parsed == value
        );
    if plain {
        value.to_string()
    } else {
        format!("'{}'", single_quoted(value))
    }
}

/// Renders `app-update.yml` for the given updater configuration.
pub fn render_update_descriptor(config: &UpdaterConfig, app_name: &str) -> Result<String> {
    let data = UpdateDescriptorData {
        url: single_quoted(&config.url),
        channel: yaml_scalar(config.channel()),
        cache_dir_name: yaml_scalar(&config.cache_dir_name(app_name)),
    };
    Ok(registry()?.render("app-update", &data)?)
}

/// Renders `<channel>.yml` for an installer, stamped with the current time.
pub fn render_channel_descriptor(artifact: &ArtifactDescriptor, version: &str) -> Result<String> {
    render_channel_descriptor_at(artifact, version, Utc::now())
}

/// Renders `<channel>.yml` with an explicit release timestamp.
pub fn render_channel_descriptor_at(
    artifact: &ArtifactDescriptor,
    version: &str,
    release_date: DateTime<Utc>,
) -> Result<String> {
    let data = ChannelDescriptorData {
        version: yaml_scalar(version),
        file_name: yaml_scalar(&artifact.file_name()),
        sha512: yaml_scalar(&artifact.sha512),
        size: artifact.size,
        release_date: release_date.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    Ok(registry()?.render("channel", &data)?)
}

/// Writes `<dir>/app-update.yml` and returns its path.
pub async fn write_update_descriptor(
    dir: &Path,
    config: &UpdaterConfig,
    app_name: &str,
) -> Result<PathBuf> {
    let contents = render_update_descriptor(config, app_name)?;
    let path = dir.join(APP_UPDATE_FILE_NAME);

    log::debug!("Writing {} to {}:\n{}", APP_UPDATE_FILE_NAME, dir.display(), contents);
    tokio::fs::write(&path, contents)
        .await
        .fs_context("writing update descriptor", &path)?;

    Ok(path)
}

/// Writes `<dir>/<channel>.yml` for `artifact` and returns its path.
pub async fn write_channel_descriptor(
    dir: &Path,
    config: &UpdaterConfig,
    artifact: &ArtifactDescriptor,
    version: &str,
) -> Result<PathBuf> {
    let contents = render_channel_descriptor(artifact, version)?;
    let path = dir.join(config.channel_file_name());

    log::debug!(
        "Writing {} to {}:\n{}",
        config.channel_file_name(),
        dir.display(),
        contents
    );
    tokio::fs::write(&path, contents)
        .await
        .fs_context("writing channel descriptor", &path)?;

    Ok(path)
}

/// Parses a `<channel>.yml`.
pub async fn read_channel_manifest(path: &Path) -> Result<ChannelManifest> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading channel manifest", path)?;
    serde_yaml::from_str(&contents)
        .map_err(crate::bundler::Error::from)
        .with_context(|| format!("parsing channel manifest {}", path.display()))
}

/// Re-hashes the installer a channel manifest points at.
///
/// The installer is resolved relative to the manifest's directory. A
/// manifest whose `files[0]` disagrees with its top-level `path`/`sha512`
/// is rejected before hashing.
pub async fn verify_channel_manifest(path: &Path) -> Result<Verification> {
    let manifest = read_channel_manifest(path).await?;

    let entry = manifest
        .files
        .first()
        .with_context(|| format!("{} lists no files", path.display()))?;
    if entry.url != manifest.path || entry.sha512 != manifest.sha512 {
        crate::bail!(
            "{} is inconsistent: files[0] does not match the top-level path/sha512",
            path.display()
        );
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let installer = base.join(&manifest.path);
    let actual_size = artifact::size_of(&installer).await?;
    let actual_sha512 = artifact::compute_hash(&installer).await?;
    let expected_size = entry.size;

    Ok(Verification {
        installer,
        expected_sha512: manifest.sha512,
        actual_sha512,
        expected_size,
        actual_size,
    })
}
