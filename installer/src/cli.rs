//! CLI argument definitions for the release installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::artefact::error::ArtefactError;
use crate::artefact::fetch::DEFAULT_FETCH_TIMEOUT;
use crate::artefact::target::TargetTriple;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::time::Duration;

/// Environment variable consulted when `--bin-dir` is not given.
pub const BIN_DIR_ENV: &str = "RELEASE_INSTALLER_BIN_DIR";

/// Fetch, verify, and install prebuilt release binaries.
#[derive(Parser, Debug)]
#[command(name = "release-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch, verify, and install prebuilt release binaries.\n\n",
    "A release descriptor pins one version of one binary: where its archive ",
    "is published and the SHA-256 the archive must hash to. The installer ",
    "downloads the archive, refuses it unless the digest matches, and only ",
    "then extracts the binary into the installation directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the pinned release:\n",
    "    $ release-installer install formula/cloudwrap.toml\n\n",
    "  Install into a custom directory:\n",
    "    $ release-installer install formula/cloudwrap.toml --bin-dir /opt/bin\n\n",
    "  Check an archive without installing it:\n",
    "    $ release-installer verify formula/cloudwrap.toml\n\n",
    "  Show the resolved download URL:\n",
    "    $ release-installer show formula/cloudwrap.toml\n\n",
    "  Compute the checksum for a new descriptor:\n",
    "    $ release-installer checksum cloudwrap_0.2.2_x86_64-apple-darwin.tar.gz",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download, verify, and install a release binary.
    Install(InstallArgs),

    /// Download and verify a release archive without installing it.
    Verify(VerifyArgs),

    /// Print the release a descriptor resolves to.
    Show(ShowArgs),

    /// Print the SHA-256 of a local file.
    Checksum(ChecksumArgs),
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone)]
pub struct InstallArgs {
    /// Release descriptor file (TOML).
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: Utf8PathBuf,

    /// Installation directory [default: platform user binary directory].
    #[arg(short, long, value_name = "DIR", env = BIN_DIR_ENV)]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Install for this target triple instead of the pinned one.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target)]
    pub target: Option<TargetTriple>,

    /// Download timeout in seconds; must be at least 1.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Show what would be installed and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the verify command.
#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    /// Release descriptor file (TOML).
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: Utf8PathBuf,

    /// Verify the archive for this target triple instead of the pinned one.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target)]
    pub target: Option<TargetTriple>,

    /// Download timeout in seconds; must be at least 1.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the show command.
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Release descriptor file (TOML).
    #[arg(value_name = "DESCRIPTOR")]
    pub descriptor: Utf8PathBuf,

    /// Resolve for this target triple instead of the pinned one.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target)]
    pub target: Option<TargetTriple>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the checksum command.
#[derive(Parser, Debug, Clone)]
pub struct ChecksumArgs {
    /// File to hash.
    #[arg(value_name = "FILE")]
    pub file: Utf8PathBuf,
}

fn parse_target(value: &str) -> Result<TargetTriple, ArtefactError> {
    TargetTriple::try_from(value)
}

impl InstallArgs {
    /// Return the download timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl VerifyArgs {
    /// Return the download timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Cli {
    /// Return the log filter implied by `-q`/`-v` on the active command.
    ///
    /// Warnings are shown by default; `-q` restricts output to errors and
    /// each `-v` raises the level by one step up to `trace`.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use log::LevelFilter;
    /// use release_installer::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["release-installer", "install", "tool.toml", "-vv"]);
    /// assert_eq!(cli.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        let (verbosity, quiet) = match &self.command {
            Command::Install(args) => (args.verbosity, args.quiet),
            Command::Verify(args) => (args.verbosity, args.quiet),
            Command::Show(_) | Command::Checksum(_) => (0, false),
        };
        if quiet {
            return LevelFilter::Error;
        }
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
