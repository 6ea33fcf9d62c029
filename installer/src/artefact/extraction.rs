//! Archive extraction for release artefacts.
//!
//! Supports gzip- and zstd-compressed tarballs and zip files. Every entry is
//! checked for path traversal before anything is written, and Unix
//! permission bits recorded in the archive are kept so that the executable
//! bit survives extraction.

use log::trace;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Compression and container formats the installer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// `.tar.gz` / `.tgz`
    TarGz,
    /// `.tar.zst` / `.tzst`
    TarZst,
    /// `.zip`
    Zip,
}

const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".tar.zst", ArchiveFormat::TarZst),
    (".tzst", ArchiveFormat::TarZst),
    (".zip", ArchiveFormat::Zip),
];

impl ArchiveFormat {
    /// Detect the format from an archive file name.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] when no known suffix
    /// matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_installer::artefact::extraction::ArchiveFormat;
    ///
    /// let format = ArchiveFormat::detect("cloudwrap_0.2.2_x86_64-apple-darwin.tar.gz")
    ///     .expect("known format");
    /// assert_eq!(format, ArchiveFormat::TarGz);
    /// ```
    pub fn detect(archive_name: &str) -> Result<Self, ExtractionError> {
        let lower = archive_name.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| lower.ends_with(suffix))
            .map(|(_, format)| *format)
            .ok_or_else(|| ExtractionError::UnsupportedFormat {
                name: archive_name.to_owned(),
            })
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TarGz => "tar.gz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        };
        write!(f, "{name}")
    }
}

/// Trait for extracting artefact archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the regular files that were written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`]
    /// if no files are found, and [`ExtractionError::Io`] on malformed data
    /// or I/O failures.
    fn extract(
        &self,
        format: ArchiveFormat,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction, including corrupt compressed data.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container is malformed.
    #[error("malformed zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,

    /// The file name does not carry a supported archive suffix.
    #[error("unsupported archive format: {name}; expected .tar.gz, .tgz, .tar.zst, .tzst, or .zip")]
    UnsupportedFormat {
        /// The archive file name.
        name: String,
    },

    /// No regular file in the archive carries the binary's name.
    #[error("archive does not contain a file named {binary_name}")]
    BinaryNotFound {
        /// The binary that was looked for.
        binary_name: String,
    },
}

/// Default extractor covering every [`ArchiveFormat`].
pub struct ArchiveExtractor;

impl ArtefactExtractor for ArchiveExtractor {
    fn extract(
        &self,
        format: ArchiveFormat,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let file = File::open(archive_path)?;
        let extracted = match format {
            ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(file), dest_dir)?,
            ArchiveFormat::TarZst => unpack_tar(zstd::Decoder::new(file)?, dest_dir)?,
            ArchiveFormat::Zip => unpack_zip(file, dest_dir)?,
        };

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(extracted)
    }
}

fn unpack_tar(reader: impl Read, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;

        let entry_type = entry.header().entry_type();
        if !(entry_type.is_file() || entry_type.is_dir()) {
            trace!("skipping non-regular tar entry {}", entry_path.display());
            continue;
        }

        // Directory modes from the archive are ignored so a read-only
        // directory entry cannot block the files stored beneath it.
        let dest_path = dest_dir.join(&entry_path);
        if entry_type.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest_path)?;

        trace!("extracted {}", entry_path.display());
        extracted.push(entry_path);
    }
    Ok(extracted)
}

fn unpack_zip(file: File, dest_dir: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut extracted = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let entry_path = PathBuf::from(entry.name());
        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }
        if entry.unix_mode().is_some_and(is_symlink_mode) {
            trace!("skipping symlink zip entry {}", entry_path.display());
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let permissions = std::fs::Permissions::from_mode(mode & 0o777);
                std::fs::set_permissions(&dest_path, permissions)?;
            }
        }

        trace!("extracted {}", entry_path.display());
        extracted.push(entry_path);
    }
    Ok(extracted)
}

/// Zip stores symbolic links as regular entries whose contents are the link
/// target; only the file-type bits of the Unix mode tell them apart.
const fn is_symlink_mode(mode: u32) -> bool {
    mode & 0o170_000 == 0o120_000
}

/// Validate that an entry path does not escape the destination directory
/// via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Find the extracted file whose name equals `binary_name`.
///
/// When several entries match, the one with the fewest path components wins
/// (a top-level `tool` beats `docs/examples/tool`); ties keep archive order.
///
/// # Errors
///
/// Returns [`ExtractionError::BinaryNotFound`] when no entry matches.
pub fn locate_binary<'a>(
    extracted: &'a [PathBuf],
    binary_name: &str,
) -> Result<&'a Path, ExtractionError> {
    extracted
        .iter()
        .filter(|path| path.file_name().is_some_and(|name| name == binary_name))
        .min_by_key(|path| path.components().count())
        .map(PathBuf::as_path)
        .ok_or_else(|| ExtractionError::BinaryNotFound {
            binary_name: binary_name.to_owned(),
        })
}
