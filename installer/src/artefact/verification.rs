//! Checksum computation and verification for downloaded archives.
//!
//! The archive on disk is hashed in fixed-size chunks, so verification never
//! holds a whole archive in memory. Verification always runs before
//! extraction.

use super::sha256_digest::Sha256Digest;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read buffer size used while hashing.
const HASH_CHUNK: usize = 8192;

/// A downloaded archive whose digest differs from the expected one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("checksum mismatch: expected {expected}, got {actual}")]
pub struct ChecksumMismatch {
    /// The digest recorded in the descriptor.
    pub expected: Sha256Digest,
    /// The digest of the bytes actually retrieved.
    pub actual: Sha256Digest,
}

/// Errors arising from archive verification.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// The archive could not be read for hashing.
    #[error("failed to hash archive: {0}")]
    Io(#[from] std::io::Error),

    /// The archive hashed to an unexpected digest.
    #[error(transparent)]
    Mismatch(#[from] ChecksumMismatch),
}

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::verification::compute_sha256;
///
/// let temp = tempfile::tempdir().expect("temp dir");
/// let path = temp.path().join("empty");
/// std::fs::write(&path, b"").expect("write");
/// let digest = compute_sha256(&path).expect("hash");
/// assert_eq!(
///     digest.as_str(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn compute_sha256(path: &Path) -> std::io::Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_bytes(&hasher.finalize().into()))
}

/// Hash the archive at `path` and compare it with `expected`.
///
/// Returns the computed digest on success.
///
/// # Errors
///
/// Returns [`VerificationError::Mismatch`] when the digests differ, or
/// [`VerificationError::Io`] when the archive cannot be read.
pub fn verify_checksum(
    path: &Path,
    expected: &Sha256Digest,
) -> Result<Sha256Digest, VerificationError> {
    let actual = compute_sha256(path)?;
    if &actual != expected {
        return Err(ChecksumMismatch {
            expected: expected.clone(),
            actual,
        }
        .into());
    }
    Ok(actual)
}
