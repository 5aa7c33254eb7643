//! Smoke tests for the sisreg CLI
//!
//! None of these launch a browser: they cover argument handling and the
//! paths that finish before a session is needed.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the sisreg binary
fn sisreg() -> Command {
    let mut cmd = Command::cargo_bin("sisreg").expect("sisreg binary should exist");
    cmd.env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    sisreg()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_flag() {
    sisreg()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("consulta"))
        .stdout(predicate::str::contains("lote"));
}

#[test]
fn test_no_args_fails() {
    sisreg().assert().failure();
}

#[test]
fn test_serve_help_mentions_token_env() {
    sisreg()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API_TOKEN"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
fn test_invalid_log_format() {
    sisreg()
        .args(["--log-format", "xml", "consulta", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

// ============================================================================
// Paths that never reach the browser
// ============================================================================

#[test]
fn test_blank_code_is_rejected() {
    sisreg()
        .args(["-q", "consulta", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: search code is empty"));
}

#[test]
fn test_blank_batch_prints_empty_results() {
    sisreg()
        .args(["-q", "lote", " ", ""])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resultados\": []"));
}

#[test]
fn test_lote_requires_codes() {
    sisreg().args(["lote"]).assert().failure();
}
