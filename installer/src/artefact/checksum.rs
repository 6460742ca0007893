//! Best-effort SHA-256 verification of downloaded archives.
//!
//! Upstream does not publish digests next to its tarballs, so a checksum is
//! only checked when the user supplies one. A mismatch deletes the download.

use super::sha256_digest::Sha256Digest;
use crate::error::{InstallerError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Outcome of the checksum step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumOutcome {
    /// The archive hashed to the expected digest.
    Verified(Sha256Digest),
    /// No digest was supplied; verification was skipped.
    Skipped,
}

/// Compute the SHA-256 digest of a file.
///
/// Reads the file at `path` in chunks and returns the lowercase hex digest.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Sha256Digest::try_from(format!("{:x}", hasher.finalize()))
}

/// Verify `archive_path` against `expected`, if one was supplied.
///
/// On mismatch the archive is removed before the error is returned so that
/// nothing downstream can pick it up.
///
/// # Errors
///
/// Returns [`InstallerError::ChecksumMismatch`] when the digests differ, or
/// [`InstallerError::Io`] if the archive cannot be read.
pub fn verify_archive(archive_path: &Path, expected: Option<&Sha256Digest>) -> Result<ChecksumOutcome> {
    let Some(expected) = expected else {
        log::warn!(
            "no checksum supplied for {}; skipping verification",
            archive_path.display()
        );
        return Ok(ChecksumOutcome::Skipped);
    };

    let actual = compute_sha256(archive_path)?;
    log::debug!("sha256 {} = {actual}", archive_path.display());
    if &actual != expected {
        if let Err(e) = fs::remove_file(archive_path) {
            log::warn!("could not remove {}: {e}", archive_path.display());
        }
        return Err(InstallerError::ChecksumMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(ChecksumOutcome::Verified(actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sha256_hex;

    const CONTENT: &[u8] = b"liquibase archive bytes";

    fn write_archive() -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("liquibase-4.33.0.tar.gz");
        fs::write(&path, CONTENT).expect("write archive");
        (temp, path)
    }

    #[test]
    fn compute_matches_known_digest() {
        let (_temp, path) = write_archive();
        let digest = compute_sha256(&path).expect("digest");
        assert_eq!(digest.as_str(), sha256_hex(CONTENT));
    }

    #[test]
    fn matching_digest_is_verified() {
        let (_temp, path) = write_archive();
        let expected = Sha256Digest::try_from(sha256_hex(CONTENT)).expect("valid");
        let outcome = verify_archive(&path, Some(&expected)).expect("verified");
        assert_eq!(outcome, ChecksumOutcome::Verified(expected));
        assert!(path.exists());
    }

    #[test]
    fn mismatch_deletes_the_download() {
        let (_temp, path) = write_archive();
        let expected = Sha256Digest::try_from("0".repeat(64)).expect("valid");
        let err = verify_archive(&path, Some(&expected)).expect_err("mismatch");
        assert!(matches!(err, InstallerError::ChecksumMismatch { .. }));
        assert!(!path.exists(), "mismatched archive should be removed");
    }

    #[test]
    fn absent_digest_skips_verification() {
        let (_temp, path) = write_archive();
        let outcome = verify_archive(&path, None).expect("skipped");
        assert_eq!(outcome, ChecksumOutcome::Skipped);
    }
}
