//! Placement of the verified binary into the installation directory.
//!
//! The binary is first written to a hidden temporary file inside the
//! installation directory, given its permissions, and then renamed over the
//! destination. A failure at any point drops the temporary file, so the
//! directory either holds the complete new binary or is left as it was.

use crate::artefact::identifier::Identifier;
use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Prefix for temporary files created inside the installation directory.
const TEMP_PREFIX: &str = ".release-installer-";

/// Permission bits always granted to an installed binary.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Places binaries into one installation directory.
#[derive(Debug, Clone)]
pub struct Stager {
    bin_dir: Utf8PathBuf,
}

impl Stager {
    /// Create a stager targeting `bin_dir`.
    #[must_use]
    pub fn new(bin_dir: Utf8PathBuf) -> Self {
        Self { bin_dir }
    }

    /// Return the installation directory.
    #[must_use]
    pub fn bin_dir(&self) -> &Utf8Path {
        &self.bin_dir
    }

    /// Return the path the binary will be installed at.
    #[must_use]
    pub fn destination(&self, binary_name: &Identifier) -> Utf8PathBuf {
        self.bin_dir.join(binary_name.as_str())
    }

    /// Check, without leaving anything behind, that an existing installation
    /// directory accepts new files.
    ///
    /// A missing directory passes; it is created during placement.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Permission`] when the path exists but is not
    /// a directory or rejects writes.
    pub fn preflight(&self) -> Result<()> {
        match fs::metadata(&self.bin_dir) {
            Ok(metadata) if !metadata.is_dir() => Err(InstallerError::Permission {
                path: self.bin_dir.clone(),
                reason: "path exists and is not a directory".to_owned(),
            }),
            Ok(_) => {
                let scratch_file = tempfile::Builder::new()
                    .prefix(TEMP_PREFIX)
                    .tempfile_in(&self.bin_dir)
                    .map_err(|e| self.permission_error(&e))?;
                drop(scratch_file);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.permission_error(&e)),
        }
    }

    /// Copy `source` into the installation directory as `binary_name`.
    ///
    /// Existing files at the destination are replaced atomically, which
    /// makes repeated installs of the same release overwrite-equivalent.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Permission`] when the directory cannot be
    /// created or written, and [`InstallerError::Placement`] for any other
    /// copy or rename failure.
    pub fn place(&self, source: &Path, binary_name: &Identifier) -> Result<Utf8PathBuf> {
        let destination = self.destination(binary_name);

        let created = self.missing_directories();
        let placed = fs::create_dir_all(&self.bin_dir)
            .map_err(|e| self.io_failure(&e))
            .and_then(|()| self.stage(source, &destination));
        if placed.is_err() {
            remove_empty_directories(&created);
        }
        placed?;

        debug!("placed {} at {destination}", source.display());
        Ok(destination)
    }

    fn stage(&self, source: &Path, destination: &Utf8Path) -> Result<()> {
        let mut staged = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.bin_dir)
            .map_err(|e| self.io_failure(&e))?;

        let mut reader = fs::File::open(source).map_err(|e| placement_error(source, &e))?;
        std::io::copy(&mut reader, staged.as_file_mut()).map_err(|e| self.io_failure(&e))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|e| self.io_failure(&e))?;
        apply_permissions(source, staged.path()).map_err(|e| self.io_failure(&e))?;

        staged
            .persist(destination)
            .map_err(|e| self.io_failure(&e.error))?;
        Ok(())
    }

    /// Directories placement would create, deepest first.
    fn missing_directories(&self) -> Vec<Utf8PathBuf> {
        self.bin_dir
            .ancestors()
            .take_while(|dir| !dir.as_str().is_empty() && !dir.exists())
            .map(Utf8Path::to_path_buf)
            .collect()
    }

    fn permission_error(&self, err: &std::io::Error) -> InstallerError {
        InstallerError::Permission {
            path: self.bin_dir.clone(),
            reason: err.to_string(),
        }
    }

    fn io_failure(&self, err: &std::io::Error) -> InstallerError {
        if err.kind() == ErrorKind::PermissionDenied {
            self.permission_error(err)
        } else {
            InstallerError::Placement {
                reason: format!("{}: {err}", self.bin_dir),
            }
        }
    }
}

/// Place `source` into `bin_dir` as `binary_name`.
///
/// Convenience wrapper around [`Stager::place`] for one-off placements.
///
/// # Errors
///
/// See [`Stager::place`].
pub fn place_binary(
    source: &Path,
    bin_dir: &Utf8Path,
    binary_name: &Identifier,
) -> Result<Utf8PathBuf> {
    Stager::new(bin_dir.to_owned()).place(source, binary_name)
}

/// Remove directories created by a failed placement. Only empty directories
/// are removed, so anything written there concurrently survives.
fn remove_empty_directories(created: &[Utf8PathBuf]) {
    for dir in created {
        if let Err(e) = fs::remove_dir(dir) {
            debug!("left {dir} in place after failed placement: {e}");
            return;
        }
    }
}

fn placement_error(path: &Path, err: &std::io::Error) -> InstallerError {
    InstallerError::Placement {
        reason: format!("cannot read extracted binary {}: {err}", path.display()),
    }
}

/// Give `staged` the source's permission bits plus the executable bits.
#[cfg(unix)]
fn apply_permissions(source: &Path, staged: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let source_mode = fs::metadata(source)?.permissions().mode() & 0o777;
    fs::set_permissions(
        staged,
        fs::Permissions::from_mode(source_mode | EXECUTABLE_MODE),
    )
}

#[cfg(not(unix))]
fn apply_permissions(_source: &Path, _staged: &Path) -> std::io::Result<()> {
    Ok(())
}
