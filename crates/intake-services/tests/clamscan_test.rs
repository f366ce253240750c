//! Tests for the clamscan adapter against stand-in executables.
//!
//! Run with: `cargo test -p intake-services --test clamscan_test`

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use intake_core::{ScanOutcome, VirusScanError};
use intake_processing::VirusScanner;
use intake_services::ClamScanCommand;
use tempfile::TempDir;

/// Write an executable shell script standing in for clamscan. `$3` is the scanned path.
fn fake_clamscan(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("clamscan");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn sample_file(dir: &Path) -> PathBuf {
    let path = dir.join("intake-test.upload");
    std::fs::write(&path, b"Jane Doe\n").unwrap();
    path
}

#[tokio::test]
async fn test_exit_zero_is_clean() {
    let dir = TempDir::new().unwrap();
    let scanner = ClamScanCommand::new(fake_clamscan(dir.path(), "exit 0"));

    let outcome = scanner.scan(&sample_file(dir.path())).await.unwrap();
    assert_eq!(outcome, ScanOutcome::Clean);
}

#[tokio::test]
async fn test_exit_one_reports_signature() {
    let dir = TempDir::new().unwrap();
    let scanner = ClamScanCommand::new(fake_clamscan(
        dir.path(),
        "echo \"$3: Eicar-Test-Signature FOUND\"\nexit 1",
    ));

    let outcome = scanner.scan(&sample_file(dir.path())).await.unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Infected("Eicar-Test-Signature".to_string())
    );
}

#[tokio::test]
async fn test_scanner_receives_quarantine_path() {
    let dir = TempDir::new().unwrap();
    // Clean only when the path argument points at a readable file.
    let scanner = ClamScanCommand::new(fake_clamscan(
        dir.path(),
        "if [ -r \"$3\" ]; then exit 0; else echo missing >&2; exit 2; fi",
    ));

    let outcome = scanner.scan(&sample_file(dir.path())).await.unwrap();
    assert_eq!(outcome, ScanOutcome::Clean);
}

#[tokio::test]
async fn test_other_exit_codes_are_engine_failures() {
    let dir = TempDir::new().unwrap();
    let scanner = ClamScanCommand::new(fake_clamscan(
        dir.path(),
        "echo 'LibClamAV Error: cli_loaddb(): No supported database files found' >&2\nexit 2",
    ));

    let err = scanner.scan(&sample_file(dir.path())).await.unwrap_err();
    match err {
        VirusScanError::EngineFailure(detail) => assert!(detail.contains("No supported database")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_scanner_times_out() {
    let dir = TempDir::new().unwrap();
    let scanner = ClamScanCommand::with_timeout(
        fake_clamscan(dir.path(), "sleep 5\nexit 0"),
        Duration::from_millis(200),
    );

    let err = scanner.scan(&sample_file(dir.path())).await.unwrap_err();
    assert!(matches!(err, VirusScanError::Timeout { .. }));
}

#[tokio::test]
async fn test_missing_executable_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let scanner = ClamScanCommand::new(dir.path().join("no-such-clamscan"));

    let outcome = scanner.scan(&sample_file(dir.path())).await.unwrap();
    assert_eq!(outcome, ScanOutcome::ScannerUnavailable);
}
