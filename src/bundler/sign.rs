//! Windows Authenticode code signing.
//!
//! The maker treats signing as an external collaborator behind the
//! [`Signer`] trait. [`AuthenticodeSigner`] adapts [`CodesignOptions`] to
//! the `kodegen_bundler_sign` crate's API, passing every credential
//! explicitly.
//!
//! Every failure is reported as [`Error::Sign`] and aborts the build.

use crate::bundler::{
    error::{Error, Result},
    settings::CodesignOptions,
};
use kodegen_bundler_sign::windows::SignConfig;
use std::path::{Path, PathBuf};

/// Timestamp server used when none is configured.
pub const DEFAULT_TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Code signing collaborator.
#[allow(async_fn_in_trait)]
pub trait Signer {
    /// Signs every eligible file below `dir`, returning the signed paths.
    async fn sign_directory(&self, dir: &Path, options: &CodesignOptions) -> Result<Vec<PathBuf>>;

    /// Signs a single file in place.
    async fn sign_file(&self, file: &Path, options: &CodesignOptions) -> Result<()>;
}

/// Authenticode signer backed by `kodegen_bundler_sign`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticodeSigner;

impl AuthenticodeSigner {
    fn validate(options: &CodesignOptions) -> Result<()> {
        if options.certificate_file.as_os_str().is_empty() {
            return Err(Error::Sign("codesign.certificate_file is not set".into()));
        }
        if !options.certificate_file.is_file() {
            return Err(Error::Sign(format!(
                "certificate file {} does not exist",
                options.certificate_file.display()
            )));
        }
        Ok(())
    }
}

impl Signer for AuthenticodeSigner {
    async fn sign_directory(&self, dir: &Path, options: &CodesignOptions) -> Result<Vec<PathBuf>> {
        Self::validate(options)?;
        let files = signable_files(dir, options)?;
        if files.is_empty() {
            log::warn!("No signable files found in {}", dir.display());
            return Ok(files);
        }

        for file in &files {
            self.sign_file(file, options).await?;
        }

        log::info!("✓ Signed {} file(s) in {}", files.len(), dir.display());
        Ok(files)
    }

    async fn sign_file(&self, file: &Path, options: &CodesignOptions) -> Result<()> {
        Self::validate(options)?;
        log::info!("Signing {} with Authenticode", file.display());

        kodegen_bundler_sign::windows::sign_binary(file, &sign_config(options))
            .await
            .map_err(|e| Error::Sign(format!("{}: {}", file.display(), e)))?;

        let hash = kodegen_bundler_sign::windows::generate_integrity_hash(file)
            .await
            .map_err(|e| Error::Sign(format!("hashing {}: {}", file.display(), e)))?;

        log::info!(
            "✓ Signed {} (SHA-256: {})",
            file.display(),
            hash.get(..16).unwrap_or(&hash)
        );
        Ok(())
    }
}

/// Maps the plugin's codesign options onto the signing crate's configuration.
pub fn sign_config(options: &CodesignOptions) -> SignConfig {
    SignConfig {
        cert_path: options.certificate_file.clone(),
        key_path: options.key_file.clone(),
        password: options.certificate_password.clone(),
        timestamp_url: options
            .timestamp_server
            .clone()
            .or_else(|| Some(DEFAULT_TIMESTAMP_URL.to_string())),
        app_name: options.description.clone(),
        app_url: options.website.clone(),
    }
}

/// Files below `dir` whose extension is eligible for signing, sorted.
pub fn signable_files(dir: &Path, options: &CodesignOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| Error::Sign(format!("walking {}: {}", dir.display(), e)))?;
        if entry.file_type().is_file() && options.should_sign(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options() -> CodesignOptions {
        CodesignOptions {
            certificate_file: "cert.pfx".into(),
            certificate_password: Some("secret".into()),
            description: Some("MyApp".into()),
            website: Some("https://example.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sign_config_mapping() {
        let config = sign_config(&options());
        assert_eq!(config.cert_path, PathBuf::from("cert.pfx"));
        assert_eq!(config.key_path, None);
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.timestamp_url.as_deref(), Some(DEFAULT_TIMESTAMP_URL));
        assert_eq!(config.app_name.as_deref(), Some("MyApp"));
        assert_eq!(config.app_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_sign_config_explicit_timestamp_and_key() {
        let mut opts = options();
        opts.timestamp_server = Some("http://ts.example.com".into());
        opts.key_file = Some("key.pem".into());

        let config = sign_config(&opts);
        assert_eq!(config.timestamp_url.as_deref(), Some("http://ts.example.com"));
        assert_eq!(config.key_path, Some(PathBuf::from("key.pem")));
    }

    #[test]
    fn test_signable_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("resources")).unwrap();
        std::fs::write(tmp.path().join("MyApp.exe"), b"").unwrap();
        std::fs::write(tmp.path().join("ffmpeg.dll"), b"").unwrap();
        std::fs::write(tmp.path().join("resources/app.asar"), b"").unwrap();

        let files = signable_files(tmp.path(), &options()).unwrap();
        assert_eq!(
            files,
            vec![tmp.path().join("MyApp.exe"), tmp.path().join("ffmpeg.dll")]
        );
    }

    #[tokio::test]
    async fn test_missing_certificate_is_sign_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("MyApp.exe"), b"MZ").unwrap();
        let mut opts = options();
        opts.certificate_file = tmp.path().join("missing.pfx");

        let err = AuthenticodeSigner
            .sign_directory(tmp.path(), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sign(_)));

        let err = AuthenticodeSigner
            .sign_file(&tmp.path().join("MyApp.exe"), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sign(_)));
    }
}
