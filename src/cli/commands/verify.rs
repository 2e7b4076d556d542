//! Verify command implementation.
//!
//! Re-hashes the installer a channel manifest points at.

use crate::bundler::updater;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

/// Execute verify command
pub(super) async fn execute_verify(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Verify { manifest } = &args.command else {
        unreachable!("execute_verify called with non-Verify command");
    };

    let verification = updater::verify_channel_manifest(manifest).await?;
    config.verbose_println(&format!("Installer: {}", verification.installer.display()));

    if verification.is_valid() {
        config.success_println(&format!(
            "{} matches {} ({} bytes)",
            manifest.display(),
            verification.installer.display(),
            verification.actual_size
        ));
        return Ok(0);
    }

    config.error_println(&format!(
        "{} does not match {}",
        manifest.display(),
        verification.installer.display()
    ));
    if verification.expected_sha512 != verification.actual_sha512 {
        config.indent(&format!("sha512 expected {}", verification.expected_sha512));
        config.indent(&format!("sha512 actual   {}", verification.actual_sha512));
    }
    if verification.expected_size != verification.actual_size {
        config.indent(&format!(
            "size expected {} bytes, actual {} bytes",
            verification.expected_size, verification.actual_size
        ));
    }

    Ok(1)
}
