//! Integration tests for the `holeglow` binary.
//!
//! These run the binary via `assert_cmd`. Commands that need the status API
//! point it at a closed local port, so they fail the pre-check quickly.

use std::net::TcpListener;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("holeglow")
}

/// Write a config whose status API nobody listens on.
fn unreachable_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        format!(r#"{{"pihole_api_url": "http://127.0.0.1:{port}/admin/api.php"}}"#),
    )
    .unwrap();
    path
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("holeglow"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("test"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_unknown_argument_prints_usage() {
    cli()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn cli_check_help_mentions_json() {
    cli()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"));
}

// ── check against an unreachable API ──

#[test]
fn cli_check_fails_when_api_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    cli()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Status API:"))
        .stdout(predicate::str::contains("FAILED"))
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn cli_check_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    let output = cli()
        .arg("--config")
        .arg(&config)
        .args(["check", "--json"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("check --json should produce valid JSON");
    assert_eq!(json["api"]["ok"], false);
    assert!(json["api"]["error"].is_string());
    assert!(json["board"]["ok"].is_boolean());
    assert_eq!(
        json["config_file"].as_str(),
        Some(config.display().to_string().as_str())
    );
}

#[test]
fn cli_test_fails_precheck_when_api_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    cli()
        .arg("--config")
        .arg(&config)
        .arg("test")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot connect to status API"));
}

#[test]
fn cli_monitor_fails_precheck_when_api_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    cli().arg("--config").arg(&config).assert().code(1);
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    cli()
        .arg("-v")
        .arg("--config")
        .arg(&config)
        .args(["check", "--json"])
        .assert()
        .code(1);
}

#[test]
fn cli_bad_config_override_is_warned_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = unreachable_config(&dir);
    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config).unwrap()).unwrap();
    json["update_interval"] = serde_json::json!(0);
    std::fs::write(&config, json.to_string()).unwrap();

    cli()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("update_interval"));
}
