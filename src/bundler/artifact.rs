//! Installer artifact descriptors for update manifests.
//!
//! An [`ArtifactDescriptor`] carries the integrity data the update client
//! checks before installing: a base64 SHA-512 digest, the byte size, and the
//! version encoded in the installer's file name.

use crate::bundler::error::{ErrorExt, Result};
use base64::Engine;
use regex::Regex;
use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::io::AsyncReadExt;

/// Read buffer size for streamed hashing.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

static SETUP_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Setup (.*)\.exe").expect("installer name regex is valid")
});

/// Hash, size and version of one installer file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Installer location.
    pub path: PathBuf,
    /// Base64-encoded SHA-512 of the file contents.
    pub sha512: String,
    /// File size in bytes.
    pub size: u64,
    /// Version parsed from the file name, if it follows `Setup <version>.exe`.
    pub version: Option<String>,
}

impl ArtifactDescriptor {
    /// Computes hash, size and version of the file at `path`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = size_of(path).await?;
        let sha512 = compute_hash(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            sha512,
            size,
            version: version_from_name(path),
        })
    }

    /// Base name written into manifests (`path`, `files[].url`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Returns the base64 SHA-512 digest of the file at `path`.
///
/// The file is streamed in chunks, so installers of any size hash in
/// constant memory.
pub async fn compute_hash(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(base64::engine::general_purpose::STANDARD.encode(hasher.finalize()))
}

/// Returns the size in bytes of the file at `path`.
pub async fn size_of(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;
    Ok(metadata.len())
}

/// Extracts `<version>` from an installer named `... Setup <version>.exe`.
///
/// Only the file name is inspected. Returns `None` when it does not match;
/// callers fall back to a configured version.
pub fn version_from_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    SETUP_VERSION_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns true if `path` names a Windows executable.
pub fn is_installer_executable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("exe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // printf 'hello' | openssl dgst -sha512 -binary | base64
    const HELLO_SHA512: &str =
        "m3HSJL1i83hdltRq0+o9czGb+8KJDKra4t/3JRlnPKcjI8PZm6XBHXx6zG4UuMXaDEZjR1wuXDre9G9zvN7AQw==";

    #[tokio::test]
    async fn test_compute_hash_known_value() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hello.bin");
        std::fs::write(&file, b"hello").unwrap();

        assert_eq!(compute_hash(&file).await.unwrap(), HELLO_SHA512);
    }

    #[tokio::test]
    async fn test_compute_hash_deterministic_and_sensitive() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("MyApp Setup 1.0.0.exe");
        let mut content = vec![0x5au8; HASH_CHUNK_SIZE * 3 + 17];
        std::fs::write(&file, &content).unwrap();

        let first = compute_hash(&file).await.unwrap();
        let second = compute_hash(&file).await.unwrap();
        assert_eq!(first, second);

        content[HASH_CHUNK_SIZE + 1] ^= 0x01;
        std::fs::write(&file, &content).unwrap();
        assert_ne!(compute_hash(&file).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_compute_hash_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = compute_hash(&dir.path().join("absent.exe")).await.unwrap_err();
        assert_eq!(
            err.io_error().map(std::io::Error::kind),
            Some(std::io::ErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_size_of() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.exe");
        let sized = dir.path().join("sized.exe");
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&sized, vec![1u8; 12345]).unwrap();

        assert_eq!(size_of(&empty).await.unwrap(), 0);
        assert_eq!(size_of(&sized).await.unwrap(), 12345);
        assert!(size_of(&dir.path().join("missing.exe")).await.is_err());
    }

    #[test]
    fn test_version_from_name() {
        assert_eq!(
            version_from_name(Path::new("Setup 3.2.1.exe")).as_deref(),
            Some("3.2.1")
        );
        assert_eq!(
            version_from_name(Path::new("/out/nsis/x64/MyApp Setup 1.4.0-beta.2.exe")).as_deref(),
            Some("1.4.0-beta.2")
        );
        assert_eq!(version_from_name(Path::new("installer.exe")), None);
        assert_eq!(version_from_name(Path::new("Setup .exe")), None);
    }

    #[test]
    fn test_version_ignores_directories() {
        assert_eq!(
            version_from_name(Path::new("/builds/Setup 9.9.9.exe/installer.exe")),
            None
        );
    }

    #[test]
    fn test_is_installer_executable() {
        assert!(is_installer_executable(Path::new("MyApp Setup 1.0.0.exe")));
        assert!(is_installer_executable(Path::new("SETUP.EXE")));
        assert!(!is_installer_executable(Path::new("MyApp.exe.blockmap")));
        assert!(!is_installer_executable(Path::new("latest.yml")));
    }

    #[tokio::test]
    async fn test_descriptor_from_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("MyApp Setup 2.0.1.exe");
        std::fs::write(&file, b"hello").unwrap();

        let artifact = ArtifactDescriptor::from_path(&file).await.unwrap();
        assert_eq!(artifact.sha512, HELLO_SHA512);
        assert_eq!(artifact.size, 5);
        assert_eq!(artifact.version.as_deref(), Some("2.0.1"));
        assert_eq!(artifact.file_name(), "MyApp Setup 2.0.1.exe");
    }
}
