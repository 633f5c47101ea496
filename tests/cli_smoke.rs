//! CLI smoke tests
//!
//! Verifies the binary parses its surface and that the offline `history`
//! command works against an isolated cache directory.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("carelink").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("upload"));
}

#[test]
fn test_history_with_empty_cache_reports_nothing_cached() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("carelink").unwrap();
    cmd.env("CARELINK_CACHE_DIR", dir.path().join("cache"))
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached conversation"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("carelink").unwrap();
    cmd.arg("frobnicate").assert().failure();
}
