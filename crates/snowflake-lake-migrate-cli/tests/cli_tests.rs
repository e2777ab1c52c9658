//! CLI integration tests for snowflake-lake-migrate.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the snowflake-lake-migrate binary.
fn cmd() -> Command {
    Command::cargo_bin("snowflake-lake-migrate").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list-tables"))
        .stdout(predicate::str::contains("describe"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("snowflake-lake-migrate"));
}

#[test]
fn test_describe_requires_table_argument() {
    cmd().args(["describe"]).assert().failure();
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_incomplete_config_fails() {
    let dir = std::env::temp_dir().join("slm-cli-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("incomplete.yaml");
    std::fs::write(&path, "source:\n  account: xy12345\n").unwrap();

    cmd()
        .args(["--config", path.to_str().unwrap(), "run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
