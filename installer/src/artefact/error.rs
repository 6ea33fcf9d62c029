//! Error types for release descriptor fields.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid descriptor values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// An owner, project, or binary name is empty or contains characters
    /// outside the permitted set.
    #[error("invalid {field} \"{value}\": {reason}")]
    InvalidIdentifier {
        /// The descriptor field being validated.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A version string is not of the form `MAJOR.MINOR.PATCH[-pre][+build]`.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A target triple is empty or malformed.
    #[error("invalid target triple \"{value}\": {reason}")]
    InvalidTarget {
        /// The rejected triple string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A URL template contains unknown placeholders, unbalanced braces, or
    /// an unsupported scheme.
    #[error("invalid URL template \"{value}\": {reason}")]
    InvalidUrlTemplate {
        /// The rejected template.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
