//! Release installer CLI entrypoint.
//!
//! This binary loads a release descriptor, then installs, verifies, or
//! describes the pinned release. Progress goes to stderr; `show` and
//! `checksum` write their results to stdout.

use camino::Utf8Path;
use clap::Parser;
use log::LevelFilter;
use release_installer::artefact::descriptor_parser::load_descriptor;
use release_installer::artefact::extraction::ArchiveExtractor;
use release_installer::artefact::fetch::HttpFetcher;
use release_installer::artefact::verification::compute_sha256;
use release_installer::cli::{ChecksumArgs, Cli, Command, InstallArgs, ShowArgs, VerifyArgs};
use release_installer::dirs::{BaseDirs, SystemBaseDirs, resolve_bin_dir};
use release_installer::error::{InstallerError, Result};
use release_installer::output::{ReleaseSummary, write_stderr_line};
use release_installer::pipeline::{InstallOptions, VerifyOptions, install_with, verify_with};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemBaseDirs, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install the `env_logger` backend; `RUST_LOG` overrides the CLI level.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(
    cli: &Cli,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    match &cli.command {
        Command::Install(args) => run_install(args, dirs, stderr),
        Command::Verify(args) => run_verify(args, stderr),
        Command::Show(args) => run_show(args, stdout),
        Command::Checksum(args) => run_checksum(args, stdout),
    }
}

fn run_install(args: &InstallArgs, dirs: &dyn BaseDirs, stderr: &mut dyn Write) -> Result<()> {
    let descriptor = load_descriptor(&args.descriptor)?;
    let bin_dir = resolve_bin_dir(args.bin_dir.as_deref(), dirs)?;
    let options = InstallOptions {
        bin_dir: &bin_dir,
        target: args.target.as_ref(),
        quiet: args.quiet,
    };

    // Dry-run mode: show what would be done without side effects
    if args.dry_run {
        let release = descriptor.resolve(options.target)?;
        let destination = bin_dir.join(release.binary_name.as_str());
        write_stderr_line(stderr, "Dry run - no files will be modified");
        write_stderr_line(stderr, "");
        write_stderr_line(
            stderr,
            ReleaseSummary::new(&release, Some(destination.as_path())).display_text(),
        );
        return Ok(());
    }

    let fetcher = HttpFetcher::with_timeout(args.timeout());
    install_with(&descriptor, options, &fetcher, &ArchiveExtractor, stderr)?;
    Ok(())
}

fn run_verify(args: &VerifyArgs, stderr: &mut dyn Write) -> Result<()> {
    let descriptor = load_descriptor(&args.descriptor)?;
    let options = VerifyOptions {
        target: args.target.as_ref(),
        quiet: args.quiet,
    };
    let fetcher = HttpFetcher::with_timeout(args.timeout());
    verify_with(&descriptor, options, &fetcher, stderr)?;
    Ok(())
}

fn run_show(args: &ShowArgs, stdout: &mut dyn Write) -> Result<()> {
    let descriptor = load_descriptor(&args.descriptor)?;
    let release = descriptor.resolve(args.target.as_ref())?;
    let summary = ReleaseSummary::new(&release, None);

    let text = if args.json {
        serde_json::to_string_pretty(&summary).map_err(|e| InstallerError::WriteFailed {
            source: e.into(),
        })?
    } else {
        summary.display_text()
    };
    write_stdout_line(stdout, text)
}

fn run_checksum(args: &ChecksumArgs, stdout: &mut dyn Write) -> Result<()> {
    let digest = compute_sha256(args.file.as_std_path())?;
    write_stdout_line(stdout, format_checksum_line(&digest.to_string(), &args.file))
}

/// Format a digest the way `sha256sum` prints it.
fn format_checksum_line(digest: &str, path: &Utf8Path) -> String {
    format!("{digest}  {path}")
}

fn write_stdout_line(stdout: &mut dyn Write, message: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{message}").map_err(|source| InstallerError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use release_installer::artefact::fetch::FetchError;
    use release_installer::artefact::verification::ChecksumMismatch;
    use release_installer::test_utils::{descriptor_toml, sha256_hex};
    use rstest::{fixture, rstest};
    use std::path::PathBuf;

    struct Scratch {
        _temp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl Scratch {
        fn write_descriptor(&self, template: &str) -> Utf8PathBuf {
            let path = self.root.join("tool.toml");
            std::fs::write(&path, descriptor_toml(template, &sha256_hex(b"archive")))
                .expect("write descriptor");
            path
        }
    }

    #[fixture]
    fn scratch() -> Scratch {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        Scratch { _temp: temp, root }
    }

    /// Base directories with a fixed default installation directory.
    struct FixedDirs(Option<PathBuf>);

    impl BaseDirs for FixedDirs {
        fn home_dir(&self) -> Option<PathBuf> {
            None
        }

        fn executable_dir(&self) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[rstest]
    #[case::fetch(
        InstallerError::Fetch(FetchError::NotFound { url: "https://example.com/a.tar.gz".to_owned() }),
        2,
        "fetch failed"
    )]
    #[case::integrity(
        InstallerError::Integrity(ChecksumMismatch {
            expected: sha256_hex(b"a").try_into().expect("digest"),
            actual: sha256_hex(b"b").try_into().expect("digest"),
        }),
        3,
        "integrity check failed"
    )]
    #[case::config(
        InstallerError::Config { reason: "no home".to_owned() },
        1,
        "configuration error"
    )]
    fn exit_code_for_run_result_names_failed_stage(
        #[case] err: InstallerError,
        #[case] expected_code: i32,
        #[case] expected_message: &str,
    ) {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, expected_code);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: "));
        assert!(stderr_text.contains(expected_message));
    }

    #[rstest]
    fn dry_run_installs_nothing(scratch: Scratch) {
        let descriptor = scratch.write_descriptor("https://example.com/{binary_name}.tar.gz");
        let bin_dir = scratch.root.join("bin");
        let cli = Cli::parse_from([
            "release-installer",
            "install",
            descriptor.as_str(),
            "--bin-dir",
            bin_dir.as_str(),
            "--dry-run",
        ]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        run(&cli, &FixedDirs(None), &mut stdout, &mut stderr).expect("dry run should succeed");

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("Dry run"));
        assert!(stderr_text.contains(&format!("Destination: {bin_dir}/tool")));
        assert!(!bin_dir.exists());
    }

    #[rstest]
    fn install_uses_default_bin_dir_when_none_given(scratch: Scratch) {
        let descriptor = scratch.write_descriptor("https://example.com/{binary_name}.tar.gz");
        let default_dir = scratch.root.join("default-bin");
        let dirs = FixedDirs(Some(default_dir.clone().into_std_path_buf()));
        let args = InstallArgs {
            descriptor,
            bin_dir: None,
            target: None,
            timeout_secs: 1,
            dry_run: true,
            verbosity: 0,
            quiet: false,
        };
        let mut stderr = Vec::new();

        run_install(&args, &dirs, &mut stderr).expect("dry run should succeed");

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains(default_dir.as_str()));
    }

    #[rstest]
    fn missing_descriptor_is_a_descriptor_error(scratch: Scratch) {
        let missing = scratch.root.join("missing.toml");
        let cli = Cli::parse_from(["release-installer", "show", missing.as_str()]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let err = run(&cli, &FixedDirs(None), &mut stdout, &mut stderr)
            .expect_err("expected descriptor failure");

        assert!(matches!(err, InstallerError::Descriptor(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[rstest]
    #[case::text(false, "Source: https://example.com/tool.tar.gz")]
    #[case::json(true, "\"url\": \"https://example.com/tool.tar.gz\"")]
    fn show_prints_resolved_release(
        scratch: Scratch,
        #[case] json: bool,
        #[case] expected: &str,
    ) {
        let descriptor = scratch.write_descriptor("https://example.com/{binary_name}.tar.gz");
        let args = ShowArgs {
            descriptor,
            target: None,
            json,
        };
        let mut stdout = Vec::new();

        run_show(&args, &mut stdout).expect("show should succeed");

        let stdout_text = String::from_utf8(stdout).expect("stdout was not UTF-8");
        assert!(stdout_text.contains(expected), "unexpected output: {stdout_text}");
    }

    #[rstest]
    fn checksum_prints_sha256sum_line(scratch: Scratch) {
        let file = scratch.root.join("archive.tar.gz");
        std::fs::write(&file, b"archive").expect("write file");
        let args = ChecksumArgs { file: file.clone() };
        let mut stdout = Vec::new();

        run_checksum(&args, &mut stdout).expect("checksum should succeed");

        let stdout_text = String::from_utf8(stdout).expect("stdout was not UTF-8");
        assert_eq!(stdout_text, format!("{}  {file}\n", sha256_hex(b"archive")));
    }

    #[rstest]
    fn checksum_of_missing_file_is_an_io_error(scratch: Scratch) {
        let args = ChecksumArgs {
            file: scratch.root.join("missing"),
        };
        let mut stdout = Vec::new();

        let err = run_checksum(&args, &mut stdout).expect_err("expected failure");
        assert!(matches!(err, InstallerError::Io(_)));
    }
}
