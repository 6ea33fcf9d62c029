//! Shared test utilities for the installer crate.
//!
//! Builds real archives in memory, renders descriptor documents, and serves
//! archive bytes through a stub fetcher so that pipeline tests never touch
//! the network.

use crate::artefact::extraction::ArchiveFormat;
use crate::artefact::fetch::{ArtefactFetcher, FetchError};
use sha2::{Digest, Sha256};
use std::cell::Cell;
use std::io::Write;
use std::path::Path;

/// Kind of entry written to a test archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A symbolic link pointing at the given target.
    Symlink(String),
}

/// One entry to place in a test archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Path of the entry inside the archive.
    pub path: String,
    /// File contents; empty for directories and links.
    pub contents: Vec<u8>,
    /// Unix permission bits.
    pub mode: u32,
    /// What the entry is.
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// Create a regular file entry.
    #[must_use]
    pub fn file(path: &str, contents: &[u8], mode: u32) -> Self {
        Self {
            path: path.to_owned(),
            contents: contents.to_vec(),
            mode,
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry.
    #[must_use]
    pub fn dir(path: &str, mode: u32) -> Self {
        Self {
            path: path.to_owned(),
            contents: Vec::new(),
            mode,
            kind: EntryKind::Directory,
        }
    }

    /// Create a symbolic link entry.
    #[must_use]
    pub fn symlink(path: &str, target: &str) -> Self {
        Self {
            path: path.to_owned(),
            contents: Vec::new(),
            mode: 0o777,
            kind: EntryKind::Symlink(target.to_owned()),
        }
    }
}

/// Return the lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Build an archive of `format` holding `entries` and return its bytes.
///
/// # Errors
///
/// Returns an I/O error if any encoder fails.
pub fn archive_bytes(format: ArchiveFormat, entries: &[ArchiveEntry]) -> std::io::Result<Vec<u8>> {
    match format {
        ArchiveFormat::TarGz => {
            let encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            append_tar_entries(encoder, entries)?.finish()
        }
        ArchiveFormat::TarZst => {
            let encoder = zstd::Encoder::new(Vec::new(), 0)?;
            append_tar_entries(encoder, entries)?.finish()
        }
        ArchiveFormat::Zip => {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for entry in entries {
                let options =
                    zip::write::SimpleFileOptions::default().unix_permissions(entry.mode);
                match &entry.kind {
                    EntryKind::File => {
                        writer.start_file(entry.path.as_str(), options)?;
                        writer.write_all(&entry.contents)?;
                    }
                    EntryKind::Directory => writer.add_directory(entry.path.as_str(), options)?,
                    EntryKind::Symlink(target) => {
                        writer.add_symlink(entry.path.as_str(), target.as_str(), options)?;
                    }
                }
            }
            Ok(writer.finish()?.into_inner())
        }
    }
}

/// Build an archive and write it to `path`.
///
/// # Errors
///
/// Returns an I/O error if the archive cannot be built or written.
pub fn write_archive(
    format: ArchiveFormat,
    path: &Path,
    entries: &[ArchiveEntry],
) -> std::io::Result<()> {
    std::fs::write(path, archive_bytes(format, entries)?)
}

fn append_tar_entries<W: Write>(writer: W, entries: &[ArchiveEntry]) -> std::io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.contents.len() as u64);
        header.set_mode(entry.mode);
        match &entry.kind {
            EntryKind::File => header.set_entry_type(tar::EntryType::Regular),
            EntryKind::Directory => header.set_entry_type(tar::EntryType::Directory),
            EntryKind::Symlink(target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_link_name(target)?;
            }
        }
        builder.append_data(&mut header, &entry.path, entry.contents.as_slice())?;
    }
    builder.into_inner()
}

/// Render a descriptor document for the `acme/tool` test release.
#[must_use]
pub fn descriptor_toml(source_url_template: &str, checksum_hex: &str) -> String {
    format!(
        concat!(
            "owner = \"acme\"\n",
            "project = \"tool\"\n",
            "binary_name = \"tool\"\n",
            "version = \"1.0.0\"\n",
            "source_url_template = \"{}\"\n",
            "checksum_hex = \"{}\"\n",
        ),
        source_url_template, checksum_hex
    )
}

/// What a [`StubFetcher`] does when asked for an archive.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Write these bytes to the destination.
    Bytes(Vec<u8>),
    /// Fail as if the object does not exist.
    NotFound,
    /// Fail as if the host cannot be reached.
    Unreachable,
}

/// An [`ArtefactFetcher`] that serves a fixed response from memory.
#[derive(Debug)]
pub struct StubFetcher {
    response: StubResponse,
    calls: Cell<usize>,
}

impl StubFetcher {
    /// Create a stub that answers every request with `response`.
    #[must_use]
    pub fn new(response: StubResponse) -> Self {
        Self {
            response,
            calls: Cell::new(0),
        }
    }

    /// Create a stub that serves `bytes`.
    #[must_use]
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self::new(StubResponse::Bytes(bytes))
    }

    /// Return how many times `fetch` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ArtefactFetcher for StubFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.set(self.calls.get() + 1);
        match &self.response {
            StubResponse::Bytes(bytes) => std::fs::write(dest, bytes).map_err(FetchError::Io),
            StubResponse::NotFound => Err(FetchError::NotFound {
                url: url.to_owned(),
            }),
            StubResponse::Unreachable => Err(FetchError::Http {
                url: url.to_owned(),
                reason: "connection refused".to_owned(),
            }),
        }
    }
}
