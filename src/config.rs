//! Loading the maker configuration from TOML.
//!
//! The configuration lives either in a standalone file:
//!
//! ```toml
//! [updater]
//! url = "https://downloads.example.com/myapp"
//!
//! [installer]
//! script = "installer/app.nsi"
//! ```
//!
//! or in the `[package.metadata.bundle.nsis]` table of a `Cargo.toml`.
//! Relative paths are resolved against the directory containing the file.

use crate::bundler::MakerNsisConfig;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, ConfigError>;

/// Loads and validates the configuration at `path`.
pub fn load_config(path: &Path) -> Result<MakerNsisConfig> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut config, base_dir);
    validate(&config)?;

    log::debug!("Loaded NSIS configuration from {}: {:?}", path.display(), config);
    Ok(config)
}

/// Parses a standalone configuration or a Cargo manifest.
///
/// A document with a `[package]` table is treated as a Cargo manifest; a
/// manifest without `[package.metadata.bundle.nsis]` yields the default
/// configuration.
pub fn parse_config(content: &str) -> std::result::Result<MakerNsisConfig, toml::de::Error> {
    let mut document: toml::Table = toml::from_str(content)?;

    if !document.contains_key("package") {
        return toml::Value::Table(document).try_into();
    }

    let section = document
        .remove("package")
        .and_then(|package| nested(package, &["metadata", "bundle", "nsis"]));

    match section {
        Some(section) => section.try_into(),
        None => {
            log::debug!("No [package.metadata.bundle.nsis] table; using defaults");
            Ok(MakerNsisConfig::default())
        }
    }
}

fn nested(value: toml::Value, keys: &[&str]) -> Option<toml::Value> {
    keys.iter().try_fold(value, |current, key| match current {
        toml::Value::Table(mut table) => table.remove(*key),
        _ => None,
    })
}

/// Resolves relative file paths against `base_dir`.
pub fn resolve_paths(config: &mut MakerNsisConfig, base_dir: &Path) {
    let resolve = |path: &mut PathBuf| {
        if path.is_relative() && !path.as_os_str().is_empty() {
            *path = base_dir.join(&*path);
        }
    };

    if let Some(codesign) = config.codesign.as_mut() {
        resolve(&mut codesign.certificate_file);
        if let Some(key) = codesign.key_file.as_mut() {
            resolve(key);
        }
    }
    if let Some(script) = config.installer.script.as_mut() {
        resolve(script);
    }
}

/// Checks values serde cannot check.
pub fn validate(config: &MakerNsisConfig) -> Result<()> {
    if let Some(updater) = &config.updater {
        url::Url::parse(&updater.url).map_err(|source| ConfigError::InvalidUrl {
            url: updater.url.clone(),
            source,
        })?;

        if let Some(channel) = &updater.channel
            && (channel.contains('/') || channel.contains('\\'))
        {
            return Err(ConfigError::InvalidValue {
                field: "updater.channel".to_string(),
                reason: format!("'{}' must not contain path separators", channel),
            });
        }
    }

    if let Some(codesign) = &config.codesign
        && codesign.certificate_file.as_os_str().is_empty()
    {
        return Err(ConfigError::InvalidValue {
            field: "codesign.certificate_file".to_string(),
            reason: "is required when [codesign] is present".to_string(),
        });
    }

    Ok(())
}

/// Overrides the configured certificate password.
pub fn with_certificate_password(
    mut config: MakerNsisConfig,
    password: Option<String>,
) -> MakerNsisConfig {
    if let (Some(codesign), Some(password)) = (config.codesign.as_mut(), password) {
        codesign.certificate_password = Some(password);
    }
    config
}
