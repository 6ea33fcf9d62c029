//! Semantic version newtype for release descriptors.
//!
//! Accepts `MAJOR.MINOR.PATCH` with optional `-prerelease` and `+build`
//! suffixes. Numeric components must not carry leading zeros. The version is
//! treated as an opaque pinned string once validated; no ordering or range
//! logic is provided.

use super::error::{ArtefactError, Result};
use serde::Serialize;
use std::fmt;

/// A validated semantic version string (e.g. `0.2.2` or `1.0.0-rc.1`).
///
/// # Examples
///
/// ```
/// use release_installer::artefact::version::Version;
///
/// let version: Version = "0.2.2".try_into().expect("valid version");
/// assert_eq!(version.as_str(), "0.2.2");
/// assert!(Version::try_from("v0.2").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_suffix_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '.'
}

impl TryFrom<&str> for Version {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Version {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_version(value: &str) -> Result<()> {
    let invalid = |reason: String| ArtefactError::InvalidVersion {
        value: value.to_owned(),
        reason,
    };

    let (rest, build) = match value.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (value, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return Err(invalid(format!(
            "expected MAJOR.MINOR.PATCH, found {} component(s)",
            parts.len()
        )));
    }
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(format!("\"{part}\" is not a number")));
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err(invalid(format!("\"{part}\" has a leading zero")));
        }
    }

    for (label, suffix) in [("pre-release", pre), ("build metadata", build)] {
        let Some(suffix) = suffix else { continue };
        if suffix.is_empty() || suffix.split('.').any(str::is_empty) {
            return Err(invalid(format!("{label} has an empty identifier")));
        }
        if let Some(bad) = suffix.chars().find(|c| !is_valid_suffix_char(*c)) {
            return Err(invalid(format!("invalid character '{bad}' in {label}")));
        }
    }
    Ok(())
}
