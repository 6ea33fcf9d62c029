//! Identifier newtype for descriptor names.
//!
//! Owners, projects, and binary names share one rule set: non-empty, ASCII
//! alphanumerics plus `-`, `_`, and `.`, and never `.` or `..`. A binary name
//! that passes validation therefore cannot contain a path separator, which
//! keeps placement confined to the installation directory.

use super::error::{ArtefactError, Result};
use serde::Serialize;
use std::fmt;

/// A validated descriptor identifier (owner, project, or binary name).
///
/// # Examples
///
/// ```
/// use release_installer::artefact::identifier::Identifier;
///
/// let name = Identifier::new("binary_name", "cloudwrap").expect("valid name");
/// assert_eq!(name.as_str(), "cloudwrap");
/// assert!(Identifier::new("binary_name", "../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

fn is_valid_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

impl Identifier {
    /// Validate `value` as the descriptor field named `field`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidIdentifier`] when the value is empty,
    /// is `.` or `..`, or contains a character outside the permitted set.
    pub fn new(field: &'static str, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_identifier(field, &value)?;
        Ok(Self(value))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: String| ArtefactError::InvalidIdentifier {
        field,
        value: value.to_owned(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty".to_owned()));
    }
    if value == "." || value == ".." {
        return Err(invalid("must not be a relative path component".to_owned()));
    }
    if let Some(bad) = value.chars().find(|c| !is_valid_identifier_char(*c)) {
        return Err(invalid(format!("invalid character '{bad}'")));
    }
    Ok(())
}
