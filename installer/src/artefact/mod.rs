//! Release descriptor model and the artefact operations the installer runs
//! on it.
//!
//! # Sub-modules
//!
//! - [`descriptor`] - The immutable release descriptor and its resolution.
//! - [`descriptor_parser`] - TOML loading and descriptor errors.
//! - [`error`] - Field validation errors.
//! - [`extraction`] - Archive formats and extraction with traversal checks.
//! - [`fetch`] - Archive retrieval trait and HTTPS implementation.
//! - [`identifier`] - Owner, project, and binary name newtype.
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`target`] - Target triple newtype (`TargetTriple`).
//! - [`url_template`] - Placeholder templates for source and homepage URLs.
//! - [`verification`] - Streaming SHA-256 and checksum comparison.
//! - [`version`] - Semantic version newtype (`Version`).

pub mod descriptor;
pub mod descriptor_parser;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod identifier;
pub mod sha256_digest;
pub mod target;
pub mod url_template;
pub mod verification;
pub mod version;
