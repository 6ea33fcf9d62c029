//! Target triple newtype for platform-specific releases.
//!
//! A triple must have at least three `-`-separated components (for example
//! `x86_64-apple-darwin` or `aarch64-unknown-linux-gnu`), each made of ASCII
//! alphanumerics and underscores. The set of triples is open: descriptors
//! decide which platforms they publish.

use super::error::{ArtefactError, Result};
use serde::Serialize;
use std::fmt;

/// Minimum number of `-`-separated components in a triple.
const MIN_COMPONENTS: usize = 3;

/// A validated target triple.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::target::TargetTriple;
///
/// let triple: TargetTriple = "x86_64-apple-darwin"
///     .try_into()
///     .expect("valid target triple");
/// assert_eq!(triple.as_str(), "x86_64-apple-darwin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetTriple(String);

impl TargetTriple {
    /// Return the triple as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TargetTriple {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        validate_triple(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        validate_triple(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for TargetTriple {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_triple(value: &str) -> Result<()> {
    let invalid = |reason: String| ArtefactError::InvalidTarget {
        value: value.to_owned(),
        reason,
    };

    let components: Vec<&str> = value.split('-').collect();
    if components.len() < MIN_COMPONENTS {
        return Err(invalid(format!(
            "expected at least {MIN_COMPONENTS} '-'-separated components"
        )));
    }
    if components.iter().any(|c| c.is_empty()) {
        return Err(invalid("components must not be empty".to_owned()));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(invalid(format!("invalid character '{bad}'")));
    }
    Ok(())
}
