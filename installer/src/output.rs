//! Output formatting for the installer CLI.
//!
//! Progress and result lines are written to an injected writer (stderr in
//! the binary) so that tests can capture them. The resolved-release summary
//! used by `show` and `install --dry-run` lives here too.

use crate::artefact::descriptor::ResolvedRelease;
use crate::artefact::extraction::ArchiveFormat;
use camino::Utf8Path;
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; nothing useful to do on failure.
    }
}

/// Format the message printed after a successful install.
#[must_use]
pub fn success_message(release: &ResolvedRelease, path: &Utf8Path) -> String {
    format!(
        "Installed {} {} to {path}",
        release.binary_name, release.version
    )
}

/// What an install would do, as reported by `show` and `install --dry-run`.
///
/// # Example
///
/// ```
/// use release_installer::artefact::descriptor_parser::parse_descriptor;
/// use release_installer::output::ReleaseSummary;
///
/// let descriptor = parse_descriptor(concat!(
///     "owner = \"acme\"\n",
///     "project = \"tool\"\n",
///     "binary_name = \"tool\"\n",
///     "version = \"1.0.0\"\n",
///     "source_url_template = \"https://example.com/{binary_name}-{version}.tar.gz\"\n",
///     "checksum_hex = \"",
///     "07f31d0479e5d541f5aa44cc5205a3e5373f429ae58a6668109a9e4aabb0f333\"\n",
/// ))
/// .expect("descriptor should parse");
/// let release = descriptor.resolve(None).expect("release should resolve");
/// let summary = ReleaseSummary::new(&release, None);
///
/// assert!(summary.display_text().contains("tool-1.0.0.tar.gz"));
/// ```
#[derive(Debug, Serialize)]
pub struct ReleaseSummary<'a> {
    /// The resolved release.
    #[serde(flatten)]
    pub release: &'a ResolvedRelease,
    /// Archive format detected from the URL, if recognised.
    pub format: Option<String>,
    /// Where the binary would be installed, when known.
    pub destination: Option<&'a Utf8Path>,
}

impl<'a> ReleaseSummary<'a> {
    /// Summarise `release`, optionally with its install destination.
    #[must_use]
    pub fn new(release: &'a ResolvedRelease, destination: Option<&'a Utf8Path>) -> Self {
        let format = ArchiveFormat::detect(release.archive_name())
            .ok()
            .map(|format| format.to_string());
        Self {
            release,
            format,
            destination,
        }
    }

    /// Format the summary for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            format!("Binary: {}", self.release.binary_name),
            format!("Version: {}", self.release.version),
            format!(
                "Target: {}",
                self.release
                    .target
                    .as_ref()
                    .map_or("any", |target| target.as_str())
            ),
            format!("Homepage: {}", self.release.homepage),
            format!("Source: {}", self.release.url),
            format!("Archive: {}", self.release.archive_name()),
            format!(
                "Format: {}",
                self.format.as_deref().unwrap_or("unsupported")
            ),
            format!("SHA-256: {}", self.release.checksum),
        ];
        if let Some(destination) = self.destination {
            lines.push(format!("Destination: {destination}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::descriptor_parser::parse_descriptor;
    use crate::test_utils::{descriptor_toml, sha256_hex};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};

    #[fixture]
    fn release() -> ResolvedRelease {
        let toml = descriptor_toml(
            "https://example.com/{binary_name}-{version}.tar.gz",
            &sha256_hex(b"archive"),
        );
        parse_descriptor(&toml)
            .expect("descriptor should parse")
            .resolve(None)
            .expect("release should resolve")
    }

    #[rstest]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }

    #[rstest]
    fn success_message_names_binary_version_and_path(release: ResolvedRelease) {
        let path = Utf8PathBuf::from("/opt/bin/tool");
        assert_eq!(
            success_message(&release, &path),
            "Installed tool 1.0.0 to /opt/bin/tool"
        );
    }

    #[rstest]
    fn summary_reports_format_and_destination(release: ResolvedRelease) {
        let destination = Utf8PathBuf::from("/opt/bin/tool");
        let text = ReleaseSummary::new(&release, Some(destination.as_path())).display_text();

        assert!(text.contains("Format: tar.gz"));
        assert!(text.contains("Target: any"));
        assert!(text.contains("Destination: /opt/bin/tool"));
        assert!(text.contains("Homepage: https://github.com/acme/tool"));
    }

    #[rstest]
    fn summary_marks_unknown_formats(mut release: ResolvedRelease) {
        release.url = "https://example.com/tool.rar".to_owned();

        let summary = ReleaseSummary::new(&release, None);
        assert!(summary.format.is_none());
        assert!(summary.display_text().contains("Format: unsupported"));
    }

    #[rstest]
    fn summary_serialises_release_fields_flat(release: ResolvedRelease) {
        let json = serde_json::to_value(ReleaseSummary::new(&release, None))
            .expect("summary should serialise");

        assert_eq!(json["binary_name"], "tool");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["format"], "tar.gz");
        assert!(json["destination"].is_null());
    }

    #[rstest]
    fn summary_serialises_destination_path(release: ResolvedRelease) {
        let destination = Utf8PathBuf::from("/opt/bin/tool");
        let json = serde_json::to_value(ReleaseSummary::new(&release, Some(destination.as_path())))
            .expect("summary should serialise");

        assert_eq!(json["destination"], "/opt/bin/tool");
    }
}
