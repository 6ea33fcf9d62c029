//! URL templates for release sources and homepages.
//!
//! Templates use `{placeholder}` substitution over a fixed vocabulary:
//! `{owner}`, `{project}`, `{binary_name}`, `{version}`, and `{target}`.
//! Validation happens once at construction so that rendering is
//! infallible.

use super::error::{ArtefactError, Result};
use serde::Serialize;
use std::fmt;

/// Placeholder names accepted inside templates.
pub const PLACEHOLDERS: &[&str] = &["owner", "project", "binary_name", "version", "target"];

/// Schemes a source archive may be fetched from.
const SOURCE_SCHEMES: &[&str] = &["https://", "s3://"];

/// Schemes a homepage may use.
const HOMEPAGE_SCHEMES: &[&str] = &["https://", "http://"];

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// Publishing account.
    pub owner: &'a str,
    /// Software name.
    pub project: &'a str,
    /// Executable exposed after install.
    pub binary_name: &'a str,
    /// Pinned release version.
    pub version: &'a str,
    /// Platform triple, when the release is platform-specific.
    pub target: Option<&'a str>,
}

impl TemplateVars<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "owner" => Some(self.owner),
            "project" => Some(self.project),
            "binary_name" => Some(self.binary_name),
            "version" => Some(self.version),
            "target" => self.target,
            _ => None,
        }
    }
}

/// A validated URL template.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::url_template::{TemplateVars, UrlTemplate};
///
/// let template = UrlTemplate::source("https://dl.example.com/{project}/{version}/{binary_name}.tar.gz")
///     .expect("valid template");
/// let vars = TemplateVars {
///     owner: "acme",
///     project: "tool",
///     binary_name: "tool",
///     version: "1.0.0",
///     target: None,
/// };
/// assert_eq!(
///     template.render(&vars),
///     "https://dl.example.com/tool/1.0.0/tool.tar.gz"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

/// One lexical piece of a template.
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

impl UrlTemplate {
    /// Validate a template for a source archive URL (`https://` or `s3://`).
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidUrlTemplate`] on an unsupported
    /// scheme, unknown placeholder, or unbalanced braces.
    pub fn source(value: impl Into<String>) -> Result<Self> {
        Self::with_schemes(value.into(), SOURCE_SCHEMES)
    }

    /// Validate a template for a project homepage (`https://` or `http://`).
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::InvalidUrlTemplate`] on an unsupported
    /// scheme, unknown placeholder, or unbalanced braces.
    pub fn homepage(value: impl Into<String>) -> Result<Self> {
        Self::with_schemes(value.into(), HOMEPAGE_SCHEMES)
    }

    fn with_schemes(value: String, schemes: &[&str]) -> Result<Self> {
        if !schemes.iter().any(|scheme| value.starts_with(scheme)) {
            return Err(ArtefactError::InvalidUrlTemplate {
                reason: format!("scheme must be one of: {}", schemes.join(", ")),
                value,
            });
        }
        let checked = segments(&value).map(|parsed| first_unknown_placeholder(&parsed));
        let reason = match checked {
            Ok(None) => return Ok(Self(value)),
            Ok(Some(name)) => format!(
                "unknown placeholder {{{name}}}; expected one of: {}",
                PLACEHOLDERS.join(", ")
            ),
            Err(reason) => reason,
        };
        Err(ArtefactError::InvalidUrlTemplate { value, reason })
    }

    /// Return the raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return true when the template contains `{target}`.
    #[must_use]
    pub fn uses_target(&self) -> bool {
        self.0.contains("{target}")
    }

    /// Substitute `vars` into the template.
    ///
    /// A `{target}` placeholder with no target supplied renders as an empty
    /// string; descriptor validation prevents that combination.
    #[must_use]
    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        let mut rendered = String::with_capacity(self.0.len());
        // Construction already validated the template.
        for segment in segments(&self.0).unwrap_or_default() {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => rendered.push_str(vars.lookup(name).unwrap_or("")),
            }
        }
        rendered
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn first_unknown_placeholder(parsed: &[Segment<'_>]) -> Option<String> {
    parsed.iter().find_map(|segment| match segment {
        Segment::Placeholder(name) if !PLACEHOLDERS.contains(name) => Some((*name).to_owned()),
        _ => None,
    })
}

/// Split a template into literal and placeholder segments.
fn segments(template: &str) -> std::result::Result<Vec<Segment<'_>>, String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find(['{', '}']) {
        let (literal, tail) = rest.split_at(open);
        if tail.starts_with('}') {
            return Err("unmatched '}'".to_owned());
        }
        if !literal.is_empty() {
            out.push(Segment::Literal(literal));
        }
        let body = tail.trim_start_matches('{');
        if body.len() + 1 != tail.len() {
            return Err("nested '{'".to_owned());
        }
        let Some(close) = body.find('}') else {
            return Err("unmatched '{'".to_owned());
        };
        let (name, after) = body.split_at(close);
        if name.contains('{') {
            return Err("nested '{'".to_owned());
        }
        out.push(Segment::Placeholder(name));
        rest = after.trim_start_matches('}');
        if rest.len() + 1 != after.len() {
            return Err("unmatched '}'".to_owned());
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    Ok(out)
}
