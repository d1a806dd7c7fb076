//! Startup behaviour of the `printwatch` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn printwatch() -> Command {
    Command::cargo_bin("printwatch").unwrap()
}

#[test]
fn zero_interval_fails_before_polling() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("monitor.log");

    printwatch()
        .args(["--interval", "0", "--log_file"])
        .arg(&log_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "ERROR - Interval must be a positive integer.",
        ))
        .stderr(predicate::str::contains("Starting printer activity monitor").not());

    assert!(!log_file.exists());
}

#[test]
fn non_positive_max_pages_fails() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("monitor.log");

    printwatch()
        .args(["--max_pages", "-10", "--log_file"])
        .arg(&log_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Max pages must be a positive integer."));

    assert!(!log_file.exists());
}

#[test]
fn json_format_applies_to_validation_errors() {
    printwatch()
        .args(["--interval", "-1", "--output_format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""level":"ERROR""#))
        .stderr(predicate::str::contains(
            r#""message":"Interval must be a positive integer.""#,
        ));
}

#[test]
fn unreadable_settings_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    printwatch()
        .arg("--config")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load settings"));
}

#[test]
fn help_lists_original_flag_spellings() {
    printwatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--sensitive_keywords"))
        .stdout(predicate::str::contains("--suspicious_user"))
        .stdout(predicate::str::contains("--output_format"));
}
