//! Behaviour-driven tests for the install pipeline.
//!
//! Archives are built in memory and served through a stub fetcher, so these
//! scenarios exercise real verification, extraction, and placement without
//! network access.

use camino::Utf8PathBuf;
use release_installer::artefact::descriptor_parser::parse_descriptor;
use release_installer::artefact::extraction::{ArchiveExtractor, ArchiveFormat};
use release_installer::error::InstallerError;
use release_installer::pipeline::{InstallOptions, InstalledPath, install_with};
use release_installer::test_utils::{
    ArchiveEntry, StubFetcher, StubResponse, archive_bytes, descriptor_toml, sha256_hex,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const TEMPLATE: &str = "https://releases.example.com/{project}/{binary_name}-{version}.tar.gz";
const BINARY: &[u8] = b"#!/bin/sh\necho tool 1.0.0\n";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct InstallWorld {
    _temp: TempDir,
    bin_dir: Utf8PathBuf,
    archive: Vec<u8>,
    checksum: Option<String>,
    response: Option<StubResponse>,
    results: Vec<Result<InstalledPath, InstallerError>>,
}

#[fixture]
fn world() -> InstallWorld {
    let temp = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    InstallWorld {
        bin_dir: root.join("bin"),
        _temp: temp,
        archive: Vec::new(),
        checksum: None,
        response: None,
        results: Vec::new(),
    }
}

impl InstallWorld {
    fn install_once(&mut self, fetcher: &StubFetcher) {
        let checksum = self.checksum.as_deref().expect("checksum set");
        let descriptor =
            parse_descriptor(&descriptor_toml(TEMPLATE, checksum)).expect("descriptor");
        let options = InstallOptions {
            bin_dir: &self.bin_dir,
            target: None,
            quiet: true,
        };
        let mut stderr = Vec::new();
        let result = install_with(&descriptor, options, fetcher, &ArchiveExtractor, &mut stderr);
        self.results.push(result);
    }

    fn fetcher(&self) -> StubFetcher {
        StubFetcher::new(self.response.clone().expect("response set"))
    }

    fn last_result(&self) -> &Result<InstalledPath, InstallerError> {
        self.results.last().expect("install was run")
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a release archive containing the binary \"{name}\"")]
fn given_archive_with_binary(world: &mut InstallWorld, name: String) {
    let entries = [
        ArchiveEntry::file("tool-1.0.0/README.md", b"docs", 0o644),
        ArchiveEntry::file(&format!("tool-1.0.0/{name}"), BINARY, 0o755),
    ];
    world.archive = archive_bytes(ArchiveFormat::TarGz, &entries).expect("archive");
}

#[given("a descriptor whose checksum matches the archive")]
fn given_matching_checksum(world: &mut InstallWorld) {
    world.checksum = Some(sha256_hex(&world.archive));
}

#[given("a descriptor whose checksum does not match the archive")]
fn given_mismatched_checksum(world: &mut InstallWorld) {
    world.checksum = Some(sha256_hex(b"some other archive"));
}

#[given("the archive is served")]
fn given_archive_served(world: &mut InstallWorld) {
    world.response = Some(StubResponse::Bytes(world.archive.clone()));
}

#[given("the archive is corrupted in transit")]
fn given_archive_corrupted(world: &mut InstallWorld) {
    let mut corrupted = world.archive.clone();
    if let Some(byte) = corrupted.last_mut() {
        *byte ^= 0x80;
    }
    world.response = Some(StubResponse::Bytes(corrupted));
}

#[given("the release host is unreachable")]
fn given_host_unreachable(world: &mut InstallWorld) {
    world.response = Some(StubResponse::Unreachable);
}

#[given("the archive is missing from the release host")]
fn given_archive_missing(world: &mut InstallWorld) {
    world.response = Some(StubResponse::NotFound);
}

#[when("the release is installed")]
fn when_installed(world: &mut InstallWorld) {
    let fetcher = world.fetcher();
    world.install_once(&fetcher);
}

#[when("the release is installed twice")]
fn when_installed_twice(world: &mut InstallWorld) {
    let fetcher = world.fetcher();
    world.install_once(&fetcher);
    world.install_once(&fetcher);
    assert_eq!(fetcher.calls(), 2);
}

#[then("the binary \"{name}\" is installed with the archive's bytes")]
fn then_binary_installed(world: &mut InstallWorld, name: String) {
    let installed = world
        .last_result()
        .as_ref()
        .expect("install should succeed");
    assert_eq!(installed.path, world.bin_dir.join(&name));
    assert_eq!(std::fs::read(&installed.path).expect("read binary"), BINARY);
}

#[then("installation fails at the \"{stage}\" stage")]
fn then_fails_at_stage(world: &mut InstallWorld, stage: String) {
    let err = world
        .last_result()
        .as_ref()
        .expect_err("install should fail");
    let matches_stage = match stage.as_str() {
        "fetch" => matches!(err, InstallerError::Fetch(_)),
        "integrity" => matches!(err, InstallerError::Integrity(_)),
        "extraction" => matches!(err, InstallerError::Extraction(_)),
        other => panic!("unknown stage {other}"),
    };
    assert!(matches_stage, "expected {stage} failure, got {err:?}");
    assert!(err.to_string().starts_with(&stage));
}

#[then("the installation directory holds no files")]
fn then_no_files(world: &mut InstallWorld) {
    let is_empty = !world.bin_dir.exists()
        || std::fs::read_dir(&world.bin_dir)
            .expect("read bin dir")
            .next()
            .is_none();
    assert!(is_empty, "unexpected files in {}", world.bin_dir);
}

#[then("both installs report the same path and digest")]
fn then_same_outcome(world: &mut InstallWorld) {
    let [first, second] = world.results.as_slice() else {
        panic!("expected exactly two installs");
    };
    let first = first.as_ref().expect("first install should succeed");
    let second = second.as_ref().expect("second install should succeed");
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/install.feature",
    name = "Install a release whose archive matches its checksum"
)]
fn scenario_install_matching_archive(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Reject an archive whose checksum does not match"
)]
fn scenario_reject_mismatched_checksum(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Reject an archive corrupted after publishing"
)]
fn scenario_reject_corrupted_archive(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Report an unreachable release host"
)]
fn scenario_report_unreachable_host(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Report a missing release archive"
)]
fn scenario_report_missing_archive(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Reject an archive without the named binary"
)]
fn scenario_reject_archive_without_binary(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Reinstall the same release"
)]
fn scenario_reinstall_same_release(world: InstallWorld) {
    let _ = world;
}
