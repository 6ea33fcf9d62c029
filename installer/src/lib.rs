//! Release installer library.
//!
//! This crate fetches a pinned release archive, verifies its SHA-256 against
//! the value recorded in a release descriptor, and installs the named binary
//! from the archive. It is used by the `release-installer` CLI binary and can
//! be consumed programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Release descriptors, fetching, verification, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Installer error type and exit codes
//! - [`output`] - Progress lines and release summaries
//! - [`pipeline`] - Install and verify pipeline orchestration
//! - [`stager`] - Atomic placement of the binary into the installation directory

pub mod artefact;
pub mod cli;
pub mod dirs;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
