//! Top-level error types for kodegen_bundler_nsis.
//!
//! This module wraps bundler, configuration and CLI errors with actionable
//! error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for maker operations
pub type Result<T> = std::result::Result<T, MakerError>;

/// Main error type for all kodegen_bundler_nsis operations
#[derive(Error, Debug)]
pub enum MakerError {
    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// Configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing failed
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// Path to the configuration file
        path: PathBuf,
        /// Parsing error
        #[source]
        source: toml::de::Error,
    },

    /// Update URL is not a valid URL
    #[error("Invalid updater.url '{url}': {source}")]
    InvalidUrl {
        /// Configured URL
        url: String,
        /// Parsing error
        #[source]
        source: url::ParseError,
    },

    /// A field holds an unusable value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Dotted field name
        field: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl MakerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error as BundlerError;

        match self {
            MakerError::Bundler(BundlerError::Sign(_)) => vec![
                "Check that codesign.certificate_file points at a valid .pfx/.p12 file".to_string(),
                "Pass the certificate password with --certificate-password or WINDOWS_CERTIFICATE_PASSWORD".to_string(),
                "Set codesign.key_file when the certificate is PEM with a separate key".to_string(),
            ],
            MakerError::Bundler(BundlerError::ToolNotFound { tool, hint }) => vec![
                format!("Install {}: {}", tool, hint),
            ],
            MakerError::Bundler(BundlerError::MissingInstaller { dir }) => vec![
                format!("Inspect the files makensis produced in {}", dir.display()),
                "Make sure the NSIS script writes to ${OUTFILE}".to_string(),
            ],
            MakerError::Bundler(BundlerError::MissingVersion { .. }) => vec![
                "Pass --app-version or name the installer '<app> Setup <version>.exe'".to_string(),
            ],
            MakerError::Config(ConfigError::NotFound { path }) => vec![
                format!("Create {} or pass --config with an existing file", path.display()),
            ],
            MakerError::Cli(CliError::InvalidArguments { .. }) => vec![
                "Run with --help to see the accepted arguments".to_string(),
            ],
            MakerError::Config(ConfigError::InvalidUrl { .. }) => vec![
                "Use an absolute URL such as https://downloads.example.com/myapp".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
