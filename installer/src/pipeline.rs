//! Install pipeline orchestration.
//!
//! One linear pass per invocation: resolve the release, fetch the archive
//! into a private temporary workspace, verify its SHA-256, extract it, and
//! place the binary. Nothing is written to the installation directory until
//! every earlier step has succeeded, and the workspace is removed when the
//! call returns.

use crate::artefact::descriptor::{ReleaseDescriptor, ResolvedRelease};
use crate::artefact::extraction::{
    ArchiveExtractor, ArchiveFormat, ArtefactExtractor, locate_binary,
};
use crate::artefact::fetch::{ArtefactFetcher, HttpFetcher};
use crate::artefact::sha256_digest::Sha256Digest;
use crate::artefact::target::TargetTriple;
use crate::artefact::verification::verify_checksum;
use crate::error::Result;
#[cfg(doc)]
use crate::error::InstallerError;
use crate::output::{success_message, write_stderr_line};
use crate::stager::Stager;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Prefix for the private temporary workspace.
const WORKSPACE_PREFIX: &str = "release-installer-";

/// Sub-directory of the workspace that receives extracted entries.
const EXTRACT_DIR: &str = "extracted";

/// Caller-controlled settings for an install.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions<'a> {
    /// Directory the binary is installed into.
    pub bin_dir: &'a Utf8Path,
    /// Platform to install for; `None` uses the descriptor's pinned target.
    pub target: Option<&'a TargetTriple>,
    /// Suppress progress lines.
    pub quiet: bool,
}

/// Caller-controlled settings for a verify-only run.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions<'a> {
    /// Platform to verify; `None` uses the descriptor's pinned target.
    pub target: Option<&'a TargetTriple>,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl<'a> From<InstallOptions<'a>> for VerifyOptions<'a> {
    fn from(options: InstallOptions<'a>) -> Self {
        Self {
            target: options.target,
            quiet: options.quiet,
        }
    }
}

/// Where a successful install placed the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPath {
    /// Full path of the installed binary.
    pub path: Utf8PathBuf,
    /// Verified digest of the downloaded archive.
    pub digest: Sha256Digest,
    /// Platform that was installed, when the descriptor names one.
    pub target: Option<TargetTriple>,
}

/// Result of a verify-only run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRelease {
    /// The release that was fetched.
    pub release: ResolvedRelease,
    /// Verified digest of the downloaded archive.
    pub digest: Sha256Digest,
}

/// An archive that has been fetched and verified inside a workspace.
struct VerifiedArchive {
    workspace: TempDir,
    archive_path: PathBuf,
    release: ResolvedRelease,
    format: ArchiveFormat,
    digest: Sha256Digest,
}

/// Install the release described by `descriptor` using the network fetcher
/// and the built-in archive extractor.
///
/// # Errors
///
/// Returns the [`InstallerError`] of the first stage that fails. No file is
/// written to `options.bin_dir` on failure.
pub fn install(
    descriptor: &ReleaseDescriptor,
    options: InstallOptions<'_>,
    stderr: &mut dyn Write,
) -> Result<InstalledPath> {
    install_with(
        descriptor,
        options,
        &HttpFetcher::default(),
        &ArchiveExtractor,
        stderr,
    )
}

/// Install the release described by `descriptor` with injected fetch and
/// extract implementations.
///
/// # Errors
///
/// Returns [`InstallerError::Permission`] if the installation directory is
/// unusable, [`InstallerError::Descriptor`] if the requested target is not
/// published, [`InstallerError::Fetch`], [`InstallerError::Integrity`], or
/// [`InstallerError::Extraction`] for the corresponding stage, and
/// [`InstallerError::Placement`] if the final copy fails.
pub fn install_with(
    descriptor: &ReleaseDescriptor,
    options: InstallOptions<'_>,
    fetcher: &dyn ArtefactFetcher,
    extractor: &dyn ArtefactExtractor,
    stderr: &mut dyn Write,
) -> Result<InstalledPath> {
    let stager = Stager::new(options.bin_dir.to_owned());
    stager.preflight()?;

    let VerifiedArchive {
        workspace,
        archive_path,
        release,
        format,
        digest,
    } = fetch_verified(descriptor, options.into(), fetcher, stderr)?;

    if !options.quiet {
        write_stderr_line(stderr, format!("Extracting {}...", release.archive_name()));
    }
    let extract_dir = workspace.path().join(EXTRACT_DIR);
    std::fs::create_dir(&extract_dir)?;
    let extracted = extractor.extract(format, &archive_path, &extract_dir)?;
    debug!("extracted {} entries from {}", extracted.len(), archive_path.display());
    let binary = extract_dir.join(locate_binary(&extracted, release.binary_name.as_str())?);

    let path = stager.place(&binary, &release.binary_name)?;
    info!("installed {} {} at {path}", release.binary_name, release.version);
    if !options.quiet {
        write_stderr_line(stderr, success_message(&release, &path));
    }

    Ok(InstalledPath {
        path,
        digest,
        target: release.target,
    })
}

/// Fetch and verify the release archive without installing it.
///
/// # Errors
///
/// Returns [`InstallerError::Descriptor`], [`InstallerError::Extraction`]
/// (for an unrecognised archive format), [`InstallerError::Fetch`], or
/// [`InstallerError::Integrity`].
pub fn verify(
    descriptor: &ReleaseDescriptor,
    options: VerifyOptions<'_>,
    stderr: &mut dyn Write,
) -> Result<VerifiedRelease> {
    verify_with(descriptor, options, &HttpFetcher::default(), stderr)
}

/// Fetch and verify the release archive with an injected fetcher.
///
/// # Errors
///
/// See [`verify`].
pub fn verify_with(
    descriptor: &ReleaseDescriptor,
    options: VerifyOptions<'_>,
    fetcher: &dyn ArtefactFetcher,
    stderr: &mut dyn Write,
) -> Result<VerifiedRelease> {
    let verified = fetch_verified(descriptor, options, fetcher, stderr)?;
    if !options.quiet {
        write_stderr_line(
            stderr,
            format!("Verified {} ({})", verified.release.archive_name(), verified.digest),
        );
    }
    Ok(VerifiedRelease {
        release: verified.release,
        digest: verified.digest,
    })
}

fn fetch_verified(
    descriptor: &ReleaseDescriptor,
    options: VerifyOptions<'_>,
    fetcher: &dyn ArtefactFetcher,
    stderr: &mut dyn Write,
) -> Result<VerifiedArchive> {
    let release = descriptor.resolve(options.target)?;
    let format = ArchiveFormat::detect(release.archive_name())?;

    let workspace = tempfile::Builder::new()
        .prefix(WORKSPACE_PREFIX)
        .tempdir()?;
    let archive_path = workspace.path().join(release.archive_name());

    if !options.quiet {
        write_stderr_line(stderr, format!("Downloading {}...", release.url));
    }
    fetcher.fetch(&release.url, &archive_path)?;

    if !options.quiet {
        write_stderr_line(stderr, "Verifying checksum...");
    }
    let digest = verify_checksum(&archive_path, &release.checksum)?;
    debug!("verified {} as {digest}", archive_path.display());

    Ok(VerifiedArchive {
        workspace,
        archive_path,
        release,
        format,
        digest,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
