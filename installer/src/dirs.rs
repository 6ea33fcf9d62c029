//! Platform directory resolution for the default installation path.
//!
//! Wraps `directories-next` behind a trait so that tests can substitute
//! fixed paths.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::path::PathBuf;

/// Source of per-user platform directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Return the user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Return the platform's per-user executable directory, when it has one.
    ///
    /// `directories-next` reports this only on Linux (typically
    /// `~/.local/bin`); other platforms return `None`.
    fn executable_dir(&self) -> Option<PathBuf>;

    /// Return the directory binaries are installed into by default.
    ///
    /// Prefers the platform executable directory and falls back to
    /// `~/.local/bin`.
    fn default_bin_dir(&self) -> Option<PathBuf> {
        self.executable_dir()
            .or_else(|| self.home_dir().map(|home| home.join(".local").join("bin")))
    }
}

/// [`BaseDirs`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn executable_dir(&self) -> Option<PathBuf> {
        directories_next::BaseDirs::new()
            .and_then(|dirs| dirs.executable_dir().map(std::path::Path::to_path_buf))
    }
}

/// Choose the installation directory: the explicit value when given,
/// otherwise the platform default from `dirs`.
///
/// The `RELEASE_INSTALLER_BIN_DIR` environment variable is folded into the
/// explicit value by the CLI parser.
///
/// # Errors
///
/// Returns [`InstallerError::Config`] when no default can be determined or
/// the default is not valid UTF-8.
pub fn resolve_bin_dir(explicit: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    if let Some(bin_dir) = explicit {
        return Ok(bin_dir.to_owned());
    }
    let default = dirs.default_bin_dir().ok_or_else(|| InstallerError::Config {
        reason: "could not determine a default installation directory; pass --bin-dir"
            .to_owned(),
    })?;
    Utf8PathBuf::try_from(default).map_err(|e| InstallerError::Config {
        reason: format!("default installation directory is not valid UTF-8: {e}"),
    })
}
