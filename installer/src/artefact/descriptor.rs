//! Release descriptor: the immutable record of one published artefact.
//!
//! A descriptor names who published the release, what binary it exposes,
//! which version is pinned, where the archive lives, and the SHA-256 digest
//! the archive must hash to. Descriptors are plain data; the installer is a
//! function of them.
//!
//! A descriptor may also publish several platforms. The pinned `target`
//! carries the top-level checksum, and each extra platform carries its own
//! checksum. Such descriptors must use `{target}` in the source template so
//! that every platform resolves to a distinct archive.

use super::descriptor_parser::DescriptorError;
use super::extraction::ArchiveFormat;
use super::identifier::Identifier;
use super::sha256_digest::Sha256Digest;
use super::target::TargetTriple;
use super::url_template::{TemplateVars, UrlTemplate};
use super::version::Version;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Homepage used when a descriptor does not specify one.
pub const DEFAULT_HOMEPAGE: &str = "https://github.com/{owner}/{project}";

/// Identity fields that name a release.
///
/// Groups the owner, project, binary, and version so that the
/// [`ReleaseDescriptor`] constructor stays small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseIdentity {
    /// Publishing account.
    pub owner: Identifier,
    /// Software name.
    pub project: Identifier,
    /// Executable to expose after install.
    pub binary_name: Identifier,
    /// Pinned release version.
    pub version: Version,
}

/// Source fields that locate and authenticate a release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    /// Template rendered into the archive URL.
    pub url_template: UrlTemplate,
    /// Expected SHA-256 of the archive for the pinned target.
    pub checksum: Sha256Digest,
    /// The pinned platform the top-level checksum belongs to.
    pub target: Option<TargetTriple>,
    /// Additional platforms and their archive checksums.
    pub platforms: BTreeMap<TargetTriple, Sha256Digest>,
}

/// An immutable, validated release descriptor.
///
/// # Examples
///
/// ```
/// use release_installer::artefact::descriptor_parser::parse_descriptor;
///
/// let toml = r#"
/// owner = "acme"
/// project = "tool"
/// binary_name = "tool"
/// version = "1.0.0"
/// source_url_template = "https://dl.example.com/{project}-{version}.tar.gz"
/// checksum_hex = "0000000000000000000000000000000000000000000000000000000000000000"
/// "#;
/// let descriptor = parse_descriptor(toml).expect("valid descriptor");
/// let release = descriptor.resolve(None).expect("resolvable");
/// assert_eq!(release.url, "https://dl.example.com/tool-1.0.0.tar.gz");
/// assert_eq!(release.homepage, "https://github.com/acme/tool");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    identity: ReleaseIdentity,
    source: ReleaseSource,
    homepage: UrlTemplate,
}

/// A descriptor resolved for one platform: everything the installer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRelease {
    /// Executable to expose after install.
    pub binary_name: Identifier,
    /// Pinned release version.
    pub version: Version,
    /// Platform this release was resolved for, if platform-specific.
    pub target: Option<TargetTriple>,
    /// Rendered archive URL.
    pub url: String,
    /// Expected SHA-256 of the archive bytes.
    pub checksum: Sha256Digest,
    /// Rendered homepage URL.
    pub homepage: String,
}

impl ResolvedRelease {
    /// Return the archive file name: the last path segment of the URL with
    /// any query string or fragment removed.
    #[must_use]
    pub fn archive_name(&self) -> &str {
        archive_file_name(&self.url)
    }
}

fn archive_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

impl ReleaseDescriptor {
    /// Assemble a descriptor from validated parts.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Inconsistent`] when the template uses
    /// `{target}` without a pinned target, when extra platforms are listed
    /// without a `{target}` placeholder, when an extra platform repeats
    /// the pinned target, or when the template's file name lacks a
    /// supported archive suffix.
    pub fn new(identity: ReleaseIdentity, source: ReleaseSource) -> Result<Self, DescriptorError> {
        validate_source(&source)?;
        let homepage = UrlTemplate::homepage(DEFAULT_HOMEPAGE).map_err(DescriptorError::Field)?;
        Ok(Self {
            identity,
            source,
            homepage,
        })
    }

    /// Replace the default homepage template.
    #[must_use]
    pub fn with_homepage(self, homepage: UrlTemplate) -> Self {
        Self { homepage, ..self }
    }

    /// Return the publishing account.
    #[must_use]
    pub fn owner(&self) -> &Identifier {
        &self.identity.owner
    }

    /// Return the software name.
    #[must_use]
    pub fn project(&self) -> &Identifier {
        &self.identity.project
    }

    /// Return the executable name exposed after install.
    #[must_use]
    pub fn binary_name(&self) -> &Identifier {
        &self.identity.binary_name
    }

    /// Return the pinned version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.identity.version
    }

    /// Return the source URL template.
    #[must_use]
    pub fn url_template(&self) -> &UrlTemplate {
        &self.source.url_template
    }

    /// Return the checksum for the pinned target.
    #[must_use]
    pub fn checksum(&self) -> &Sha256Digest {
        &self.source.checksum
    }

    /// Return the pinned target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&TargetTriple> {
        self.source.target.as_ref()
    }

    /// Return every target this descriptor publishes, pinned target first.
    #[must_use]
    pub fn targets(&self) -> Vec<&TargetTriple> {
        self.source
            .target
            .iter()
            .chain(self.source.platforms.keys())
            .collect()
    }

    /// Resolve the descriptor for `requested`, or for the pinned target when
    /// `requested` is `None`.
    ///
    /// A platform-agnostic descriptor (no `{target}` in its template)
    /// ignores the requested target.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnsupportedTarget`] when the descriptor is
    /// platform-specific and does not publish `requested`.
    pub fn resolve(
        &self,
        requested: Option<&TargetTriple>,
    ) -> Result<ResolvedRelease, DescriptorError> {
        let (target, checksum) = self.select_platform(requested)?;
        let vars = TemplateVars {
            owner: self.identity.owner.as_str(),
            project: self.identity.project.as_str(),
            binary_name: self.identity.binary_name.as_str(),
            version: self.identity.version.as_str(),
            target: target.map(TargetTriple::as_str),
        };
        let release = ResolvedRelease {
            binary_name: self.identity.binary_name.clone(),
            version: self.identity.version.clone(),
            target: target.cloned(),
            url: self.source.url_template.render(&vars),
            checksum: checksum.clone(),
            homepage: self.homepage.render(&vars),
        };
        debug!(
            "resolved {} {} for {:?}: {}",
            self.identity.project, self.identity.version, release.target, release.url
        );
        Ok(release)
    }

    fn select_platform(
        &self,
        requested: Option<&TargetTriple>,
    ) -> Result<(Option<&TargetTriple>, &Sha256Digest), DescriptorError> {
        let pinned = self.source.target.as_ref();
        let Some(requested) = requested else {
            return Ok((pinned, &self.source.checksum));
        };
        if !self.source.url_template.uses_target() {
            debug!("descriptor is platform-agnostic; ignoring requested target {requested}");
            return Ok((pinned, &self.source.checksum));
        }
        if pinned == Some(requested) {
            return Ok((pinned, &self.source.checksum));
        }
        match self.source.platforms.get_key_value(requested) {
            Some((target, checksum)) => Ok((Some(target), checksum)),
            None => Err(DescriptorError::UnsupportedTarget {
                requested: requested.to_string(),
                available: self
                    .targets()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

fn validate_source(source: &ReleaseSource) -> Result<(), DescriptorError> {
    let uses_target = source.url_template.uses_target();
    if uses_target && source.target.is_none() {
        return Err(DescriptorError::Inconsistent {
            reason: "source_url_template uses {target} but no target is pinned".to_owned(),
        });
    }
    if !source.platforms.is_empty() && !uses_target {
        return Err(DescriptorError::Inconsistent {
            reason: "platforms are listed but source_url_template does not use {target}"
                .to_owned(),
        });
    }
    if let Some(pinned) = &source.target {
        if source.platforms.contains_key(pinned) {
            return Err(DescriptorError::Inconsistent {
                reason: format!("platform {pinned} repeats the pinned target"),
            });
        }
    }
    let file_name = archive_file_name(source.url_template.as_str());
    if ArchiveFormat::detect(file_name).is_err() {
        return Err(DescriptorError::Inconsistent {
            reason: format!(
                "source_url_template file name {file_name:?} does not end in \
                 .tar.gz, .tgz, .tar.zst, .tzst or .zip"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn digest(c: char) -> Sha256Digest {
        Sha256Digest::try_from(c.to_string().repeat(64)).expect("valid digest")
    }

    fn triple(value: &str) -> TargetTriple {
        TargetTriple::try_from(value).expect("valid triple")
    }

    #[fixture]
    fn identity() -> ReleaseIdentity {
        ReleaseIdentity {
            owner: Identifier::new("owner", "scirner22").expect("valid owner"),
            project: Identifier::new("project", "cloudwrap").expect("valid project"),
            binary_name: Identifier::new("binary_name", "cloudwrap").expect("valid binary"),
            version: Version::try_from("0.2.2").expect("valid version"),
        }
    }

    fn platform_source() -> ReleaseSource {
        ReleaseSource {
            url_template: UrlTemplate::source(
                "s3://bucket/{project}/{binary_name}_{version}_{target}.tar.gz",
            )
            .expect("valid template"),
            checksum: digest('a'),
            target: Some(triple("x86_64-apple-darwin")),
            platforms: BTreeMap::from([(triple("aarch64-apple-darwin"), digest('b'))]),
        }
    }

    #[rstest]
    fn resolves_pinned_target_by_default(identity: ReleaseIdentity) {
        let descriptor = ReleaseDescriptor::new(identity, platform_source()).expect("valid");
        let release = descriptor.resolve(None).expect("resolvable");
        assert_eq!(
            release.url,
            "s3://bucket/cloudwrap/cloudwrap_0.2.2_x86_64-apple-darwin.tar.gz"
        );
        assert_eq!(release.checksum, digest('a'));
        assert_eq!(release.archive_name(), "cloudwrap_0.2.2_x86_64-apple-darwin.tar.gz");
    }

    #[rstest]
    fn resolves_extra_platform_checksum(identity: ReleaseIdentity) {
        let descriptor = ReleaseDescriptor::new(identity, platform_source()).expect("valid");
        let arm = triple("aarch64-apple-darwin");
        let release = descriptor.resolve(Some(&arm)).expect("resolvable");
        assert!(release.url.ends_with("_aarch64-apple-darwin.tar.gz"));
        assert_eq!(release.checksum, digest('b'));
        assert_eq!(release.target, Some(arm));
    }

    #[rstest]
    fn rejects_unpublished_target(identity: ReleaseIdentity) {
        let descriptor = ReleaseDescriptor::new(identity, platform_source()).expect("valid");
        let err = descriptor
            .resolve(Some(&triple("x86_64-unknown-linux-gnu")))
            .expect_err("expected unsupported target");
        let msg = err.to_string();
        assert!(msg.contains("x86_64-unknown-linux-gnu"), "{msg}");
        assert!(msg.contains("x86_64-apple-darwin, aarch64-apple-darwin"), "{msg}");
    }

    #[rstest]
    fn platform_agnostic_descriptor_ignores_requested_target(identity: ReleaseIdentity) {
        let source = ReleaseSource {
            url_template: UrlTemplate::source("https://dl.example.com/{project}.tar.gz")
                .expect("valid template"),
            checksum: digest('c'),
            target: None,
            platforms: BTreeMap::new(),
        };
        let descriptor = ReleaseDescriptor::new(identity, source).expect("valid");
        let release = descriptor
            .resolve(Some(&triple("x86_64-unknown-linux-gnu")))
            .expect("resolvable");
        assert_eq!(release.target, None);
        assert_eq!(release.checksum, digest('c'));
    }

    #[rstest]
    #[case::target_placeholder_without_pin(None, BTreeMap::new(), "no target is pinned")]
    #[case::repeated_pin(
        Some(triple("x86_64-apple-darwin")),
        BTreeMap::from([(triple("x86_64-apple-darwin"), digest('b'))]),
        "repeats the pinned target"
    )]
    fn rejects_inconsistent_sources(
        identity: ReleaseIdentity,
        #[case] target: Option<TargetTriple>,
        #[case] platforms: BTreeMap<TargetTriple, Sha256Digest>,
        #[case] expected: &str,
    ) {
        let source = ReleaseSource {
            target,
            platforms,
            ..platform_source()
        };
        let err = ReleaseDescriptor::new(identity, source).expect_err("expected rejection");
        assert!(err.to_string().contains(expected), "unexpected error: {err}");
    }

    #[rstest]
    fn rejects_platforms_without_target_placeholder(identity: ReleaseIdentity) {
        let source = ReleaseSource {
            url_template: UrlTemplate::source("https://dl.example.com/tool.tar.gz")
                .expect("valid template"),
            ..platform_source()
        };
        let err = ReleaseDescriptor::new(identity, source).expect_err("expected rejection");
        assert!(err.to_string().contains("does not use {target}"));
    }

    #[rstest]
    #[case::unknown_suffix("https://dl.example.com/{project}-{version}.rar")]
    #[case::directory_url("https://dl.example.com/{project}/")]
    #[case::suffix_only_in_query("https://dl.example.com/{project}?name=tool.tar.gz")]
    fn rejects_templates_without_archive_suffix(
        identity: ReleaseIdentity,
        #[case] template: &str,
    ) {
        let source = ReleaseSource {
            url_template: UrlTemplate::source(template).expect("valid template"),
            checksum: digest('c'),
            target: None,
            platforms: BTreeMap::new(),
        };
        let err = ReleaseDescriptor::new(identity, source).expect_err("expected rejection");
        assert!(matches!(err, DescriptorError::Inconsistent { .. }), "{err:?}");
        assert!(err.to_string().contains(".tar.gz"), "unexpected error: {err}");
    }

    #[rstest]
    fn accepts_archive_suffix_followed_by_query(identity: ReleaseIdentity) {
        let source = ReleaseSource {
            url_template: UrlTemplate::source("https://dl.example.com/{project}.zip?dl=1")
                .expect("valid template"),
            checksum: digest('c'),
            target: None,
            platforms: BTreeMap::new(),
        };
        assert!(ReleaseDescriptor::new(identity, source).is_ok());
    }

    #[rstest]
    fn custom_homepage_is_rendered(identity: ReleaseIdentity) {
        let descriptor = ReleaseDescriptor::new(identity, platform_source())
            .expect("valid")
            .with_homepage(
                UrlTemplate::homepage("https://docs.example.com/{project}/{version}")
                    .expect("valid homepage"),
            );
        let release = descriptor.resolve(None).expect("resolvable");
        assert_eq!(release.homepage, "https://docs.example.com/cloudwrap/0.2.2");
    }

    #[test]
    fn archive_name_strips_query_and_fragment() {
        let release = ResolvedRelease {
            binary_name: Identifier::new("binary_name", "tool").expect("valid"),
            version: Version::try_from("1.0.0").expect("valid"),
            target: None,
            url: "https://dl.example.com/a/tool-1.0.0.tar.gz?sig=abc#frag".to_owned(),
            checksum: digest('d'),
            homepage: "https://example.com".to_owned(),
        };
        assert_eq!(release.archive_name(), "tool-1.0.0.tar.gz");
    }
}
