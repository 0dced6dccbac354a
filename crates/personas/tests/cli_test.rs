//! Integration tests for the `personas` CLI binary.
//!
//! Argument parsing, help output, completions, profile management, and
//! error exit codes, plus a few end-to-end workflow runs against wiremock.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `personas` binary with env isolation.
///
/// Clears all `PERSONAS_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn personas_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("personas");
    cmd.env("HOME", "/tmp/personas-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/personas-cli-test-nonexistent")
        .env_remove("PERSONAS_CONFIG")
        .env_remove("PERSONAS_OUTPUT")
        .env_remove("PERSONAS_INSECURE")
        .env_remove("PERSONAS_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write a config file with one node `ise-2` at `address`.
fn write_config(dir: &Path, address: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[defaults]
timeout = 5
operation_timeout = 60
retries = 0

[nodes.ise-2]
ip = "{address}"
hostname = "ise-2"
fqdn = "ise-2.example.com"
username = "admin"
password_env = "PERSONAS_TEST_ISE2_PASSWORD"
roles = ["SecondaryAdmin"]
services = ["Session"]
"#
        ),
    )
    .unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = personas_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    personas_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("check-standalone")
            .and(predicate::str::contains("register"))
            .and(predicate::str::contains("export-certs"))
            .and(predicate::str::contains("promote"))
            .and(predicate::str::contains("update-roles")),
    );
}

#[test]
fn test_version_flag() {
    personas_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("personas"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    personas_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    personas_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Node profiles ───────────────────────────────────────────────────

#[test]
fn test_nodes_list_empty_config() {
    let dir = tempfile::tempdir().unwrap();
    personas_cmd()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["nodes", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_nodes_add_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .args([
            "nodes",
            "add",
            "ise-3",
            "--ip",
            "10.0.0.3",
            "--hostname",
            "ise-3",
            "--password-env",
            "ISE3_PASSWORD",
            "--role",
            "SecondaryAdmin",
        ])
        .assert()
        .success();

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .args(["nodes", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ise-3"));

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .args(["nodes", "show", "ise-3", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"hostname\": \"ise-3\"")
                .and(predicate::str::contains("env:ISE3_PASSWORD")),
        );
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = personas_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_unknown_node_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "10.0.0.2");
    personas_cmd()
        .arg("--config")
        .arg(&config)
        .args(["check-standalone", "ise-9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_register_without_primary_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "10.0.0.2");
    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["register", "ise-2", "-y"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No primary node specified"));
}

#[test]
fn test_missing_credentials_exit_auth() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[nodes.lonely]\nip = \"10.0.0.4\"\nhostname = \"lonely\"\npassword_env = \"PERSONAS_TEST_UNSET\"\n",
    )
    .unwrap();

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env_remove("PERSONAS_TEST_UNSET")
        .args(["promote", "lonely", "-y"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("lonely"));
}

#[test]
fn test_promote_requires_confirmation_without_tty() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "10.0.0.2");
    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["promote", "ise-2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires confirmation"));
}

#[test]
fn test_timeout_flag_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "10.0.0.2");
    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["--timeout", "0", "check-standalone", "ise-2"])
        .assert()
        .code(2);
}

// ── End-to-end workflows ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_check_standalone_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/deployment/node/ise-2"))
        .and(basic_auth("admin", "pw"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": { "hostname": "ise-2", "roles": ["STANDALONE"] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ers/config/op/systemconfig/iseversion"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["-o", "json", "check-standalone", "ise-2"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"workflow\": \"check-standalone\"")
                .and(predicate::str::contains("ise-2")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_promote_failure_message_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/deployment/primary"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["promote", "ise-2", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not update node to PRIMARY"));
}

#[test]
fn test_promote_unreachable_node_names_host() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1");

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args(["promote", "ise-2", "--yes"])
        .assert()
        .code(7)
        .stderr(
            predicate::str::contains("127.0.0.1")
                .and(predicate::str::contains("Could not update node to PRIMARY").not()),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_roles_overrides_profile() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/deployment/node"))
        .and(basic_auth("admin", "pw"))
        .and(wiremock::matchers::body_json(serde_json::json!({
            "roles": ["PrimaryMonitoring"],
            "services": ["Session"]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server.uri());

    personas_cmd()
        .arg("--config")
        .arg(&config)
        .env("PERSONAS_TEST_ISE2_PASSWORD", "pw")
        .args([
            "update-roles",
            "ise-2",
            "--role",
            "PrimaryMonitoring",
            "-y",
            "-o",
            "plain",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("PrimaryMonitoring"));
}
