//! Command line argument parsing and validation.

use crate::bundler::Arch;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NSIS installer maker with auto-update metadata
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_nsis",
    version,
    about = "Build NSIS installers and electron-updater release metadata",
    long_about = "Build a Windows NSIS installer from a packaged application directory,
optionally Authenticode-sign it, and write app-update.yml / <channel>.yml.

Usage:
  kodegen_bundler_nsis make --dir out/MyApp-win32-x64 --out-dir out/make --name MyApp
  kodegen_bundler_nsis verify out/make/nsis/x64/latest.yml
  kodegen_bundler_nsis hash 'out/make/nsis/x64/MyApp Setup 1.0.0.exe'"
)]
pub struct Args {
    /// Command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Show detailed output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress everything except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Maker commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the installer
    Make {
        /// Packaged application directory
        #[arg(long, value_name = "APP_DIR")]
        dir: PathBuf,

        /// Make output root; installers land in <OUT_DIR>/nsis/<arch>
        #[arg(long, value_name = "MAKE_DIR")]
        out_dir: PathBuf,

        /// Application name
        #[arg(long)]
        name: String,

        /// Application version (semver)
        #[arg(long, value_name = "VERSION")]
        app_version: Option<String>,

        /// Target architecture (x64, ia32, arm64)
        #[arg(long, value_parser = parse_arch)]
        arch: Option<Arch>,

        /// Configuration file (standalone TOML or Cargo.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Certificate password, overriding the configuration
        #[arg(long, env = "WINDOWS_CERTIFICATE_PASSWORD", hide_env_values = true)]
        certificate_password: Option<String>,

        /// Keep staging directories after a successful build
        #[arg(long)]
        keep_temp: bool,
    },

    /// Check a channel manifest against its installer
    Verify {
        /// Path to <channel>.yml
        #[arg(value_name = "CHANNEL_YML")]
        manifest: PathBuf,
    },

    /// Print the base64 SHA-512, size and version of a file
    Hash {
        /// File to hash
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn parse_arch(value: &str) -> Result<Arch, String> {
    value
        .parse::<Arch>()
        .map_err(|e: crate::bundler::Error| e.to_string())
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Make { .. } => "make",
            Command::Verify { .. } => "verify",
            Command::Hash { .. } => "hash",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if let Command::Make {
            name, app_version, ..
        } = &self.command
        {
            if name.trim().is_empty() {
                return Err(CliError::InvalidArguments {
                    reason: "--name must not be empty".to_string(),
                });
            }
            if let Some(version) = app_version
                && let Err(e) = semver::Version::parse(version)
            {
                return Err(CliError::InvalidArguments {
                    reason: format!("--app-version '{}' is not a valid semver version: {}", version, e),
                });
            }
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}
