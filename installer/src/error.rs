//! Error types for the release installer.
//!
//! Every variant names the pipeline stage that failed so that the message
//! printed on exit tells the user where installation stopped. Each stage
//! maps to its own process exit code.

use crate::artefact::descriptor_parser::DescriptorError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::fetch::FetchError;
use crate::artefact::verification::{ChecksumMismatch, VerificationError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while installing a release.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The descriptor could not be loaded, validated, or resolved.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Retrieving the archive failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The archive digest does not match the descriptor checksum.
    #[error("integrity check failed: {0}")]
    Integrity(#[from] ChecksumMismatch),

    /// The archive is malformed or lacks the binary.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The installation directory cannot be written.
    #[error("installation directory {path} is not writable: {reason}")]
    Permission {
        /// The directory that rejected the write.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// Copying the binary into place failed for a reason other than
    /// permissions.
    #[error("placing binary failed: {reason}")]
    Placement {
        /// Description of the failure.
        reason: String,
    },

    /// Installer settings could not be resolved.
    #[error("configuration error: {reason}")]
    Config {
        /// Description of the failure.
        reason: String,
    },

    /// An I/O operation on the private workspace failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

impl From<VerificationError> for InstallerError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::Io(source) => Self::Io(source),
            VerificationError::Mismatch(mismatch) => Self::Integrity(mismatch),
        }
    }
}

impl InstallerError {
    /// Return the process exit code for this error.
    ///
    /// | Stage | Code |
    /// |-------|------|
    /// | descriptor, configuration, I/O, placement | 1 |
    /// | fetch | 2 |
    /// | integrity | 3 |
    /// | extraction | 4 |
    /// | permission | 5 |
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Fetch(_) => 2,
            Self::Integrity(_) => 3,
            Self::Extraction(_) => 4,
            Self::Permission { .. } => 5,
            Self::Descriptor(_)
            | Self::Placement { .. }
            | Self::Config { .. }
            | Self::Io(_)
            | Self::WriteFailed { .. } => 1,
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
