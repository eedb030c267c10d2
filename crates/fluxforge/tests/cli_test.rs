//! Integration tests for the `fluxforge` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live portal.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `fluxforge` binary with env isolation.
///
/// Clears all `FLUXFORGE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fluxforge_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fluxforge");
    cmd.env("HOME", "/tmp/fluxforge-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fluxforge-cli-test-nonexistent")
        .env_remove("FLUXFORGE_PROFILE")
        .env_remove("FLUXFORGE_PORTAL")
        .env_remove("FLUXFORGE_OUTPUT")
        .env_remove("FLUXFORGE_INSECURE")
        .env_remove("FLUXFORGE_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fluxforge_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    fluxforge_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("FluxForge")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("tags"))
            .and(predicate::str::contains("scan-classes"))
            .and(predicate::str::contains("influxdb")),
    );
}

#[test]
fn test_version_flag() {
    fluxforge_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fluxforge"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    fluxforge_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    fluxforge_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = fluxforge_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_devices_list_no_portal() {
    fluxforge_cmd()
        .args(["devices", "list"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("portal")
                .or(predicate::str::contains("config"))
                .or(predicate::str::contains("profile")),
        );
}

#[test]
fn test_config_show_no_config() {
    // `config show` uses load_config_or_default() so it succeeds even
    // when no config file exists — it just renders the default config.
    fluxforge_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_invalid_output_format() {
    let output = fluxforge_cmd()
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_scan_class_interval_must_be_positive() {
    let output = fluxforge_cmd()
        .args([
            "scan-classes",
            "create",
            "--name",
            "Fast",
            "--interval-ms",
            "0",
        ])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for interval 0"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("1.."),
        "Expected range validation error:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse correctly — the failure should be about
    // missing portal config, not about argument parsing.
    fluxforge_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--insecure",
            "--timeout",
            "60",
            "devices",
            "list",
        ])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("portal")
                .or(predicate::str::contains("config"))
                .or(predicate::str::contains("profile")),
        );
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_devices_subcommands_exist() {
    fluxforge_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("browse"))
                .and(predicate::str::contains("scan"))
                .and(predicate::str::contains("delete")),
        );
}

#[test]
fn test_tags_subcommands_exist() {
    fluxforge_cmd()
        .args(["tags", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("collect"))
                .and(predicate::str::contains("set-scan-class"))
                .and(predicate::str::contains("enable"))
                .and(predicate::str::contains("remove")),
        );
}

#[test]
fn test_tags_list_filter_flags_exist() {
    fluxforge_cmd()
        .args(["tags", "list", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--pattern")
                .and(predicate::str::contains("--device"))
                .and(predicate::str::contains("--group-by"))
                .and(predicate::str::contains("--unassigned")),
        );
}

#[test]
fn test_scan_classes_subcommands_exist() {
    fluxforge_cmd()
        .args(["scan-classes", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("set-default")
                .and(predicate::str::contains("clear-default"))
                .and(predicate::str::contains("create")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    fluxforge_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles")),
        );
}
