//! Descriptor deserialization from TOML.
//!
//! A descriptor file carries the six core keys (`owner`, `project`,
//! `binary_name`, `version`, `source_url_template`, `checksum_hex`) plus the
//! optional `target`, `homepage`, and `[platforms]` table. Unknown keys are
//! rejected so that typos surface instead of silently falling back.

use super::descriptor::{ReleaseDescriptor, ReleaseIdentity, ReleaseSource};
use super::error::ArtefactError;
use super::identifier::Identifier;
use super::sha256_digest::Sha256Digest;
use super::target::TargetTriple;
use super::url_template::UrlTemplate;
use super::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Errors arising from loading or resolving a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The descriptor file could not be read.
    #[error("failed to read descriptor {path}")]
    Read {
        /// Path to the descriptor file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax error or a missing/unknown key.
    #[error("descriptor parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A field failed newtype validation.
    #[error("descriptor field error: {0}")]
    Field(#[from] ArtefactError),

    /// Fields are individually valid but contradict each other.
    #[error("inconsistent descriptor: {reason}")]
    Inconsistent {
        /// Description of the contradiction.
        reason: String,
    },

    /// The requested platform is not published by this descriptor.
    #[error("target {requested} is not published by this release; available: {available}")]
    UnsupportedTarget {
        /// The requested target triple.
        requested: String,
        /// Comma-separated list of published targets.
        available: String,
    },
}

/// On-disk shape of a descriptor before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    owner: String,
    project: String,
    binary_name: String,
    version: String,
    source_url_template: String,
    checksum_hex: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    platforms: BTreeMap<String, String>,
}

impl TryFrom<RawDescriptor> for ReleaseDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let identity = ReleaseIdentity {
            owner: Identifier::new("owner", raw.owner)?,
            project: Identifier::new("project", raw.project)?,
            binary_name: Identifier::new("binary_name", raw.binary_name)?,
            version: Version::try_from(raw.version)?,
        };
        let platforms = raw
            .platforms
            .into_iter()
            .map(|(target, checksum)| {
                Ok((
                    TargetTriple::try_from(target)?,
                    Sha256Digest::try_from(checksum)?,
                ))
            })
            .collect::<Result<BTreeMap<_, _>, ArtefactError>>()?;
        let source = ReleaseSource {
            url_template: UrlTemplate::source(raw.source_url_template)?,
            checksum: Sha256Digest::try_from(raw.checksum_hex)?,
            target: raw.target.map(TargetTriple::try_from).transpose()?,
            platforms,
        };

        let descriptor = Self::new(identity, source)?;
        match raw.homepage {
            Some(homepage) => Ok(descriptor.with_homepage(UrlTemplate::homepage(homepage)?)),
            None => Ok(descriptor),
        }
    }
}

/// Parse a TOML string into a validated [`ReleaseDescriptor`].
///
/// # Errors
///
/// Returns an error if the TOML is malformed, a key is missing or unknown,
/// any field fails validation, or the fields contradict each other.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::descriptor_parser::parse_descriptor;
///
/// let toml = concat!(
///     "owner = \"acme\"\n",
///     "project = \"tool\"\n",
///     "binary_name = \"tool\"\n",
///     "version = \"1.0.0\"\n",
///     "source_url_template = \"https://dl.example.com/{binary_name}-{version}.tar.gz\"\n",
///     "checksum_hex = \"", "ab", "ab", "ab", "ab", "ab", "ab", "ab", "ab",
///     "ab", "ab", "ab", "ab", "ab", "ab", "ab", "ab",
///     "ab", "ab", "ab", "ab", "ab", "ab", "ab", "ab",
///     "ab", "ab", "ab", "ab", "ab", "ab", "ab", "ab", "\"\n",
/// );
/// let descriptor = parse_descriptor(toml).expect("valid descriptor");
/// assert_eq!(descriptor.binary_name().as_str(), "tool");
/// ```
pub fn parse_descriptor(contents: &str) -> Result<ReleaseDescriptor, DescriptorError> {
    let raw: RawDescriptor = toml::from_str(contents)?;
    ReleaseDescriptor::try_from(raw)
}

/// Read and parse the descriptor file at `path`.
///
/// # Errors
///
/// Returns [`DescriptorError::Read`] when the file cannot be read, or any
/// error from [`parse_descriptor`].
pub fn load_descriptor(path: &Utf8Path) -> Result<ReleaseDescriptor, DescriptorError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_descriptor(&contents)
}
