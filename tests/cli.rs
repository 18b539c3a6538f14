//! CLI integration tests
//!
//! Exercise the binary end-to-end for everything that doesn't need a live
//! broker: argument validation, config handling and the offline failure
//! paths.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn sempsync() -> Command {
    Command::cargo_bin("sempsync").expect("binary builds")
}

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut file = std::fs::File::create(&path).expect("create config");
    file.write_all(
        b"router:\n  sempUrl: http://localhost:1\n  sempUser: admin\n  sempPassword: admin\nvpn:\n  msgVpnNames: [test-vpn]\n",
    )
    .expect("write config");
    path
}

#[test]
fn help_lists_subcommands() {
    sempsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("provision"));
}

#[test]
fn version_subcommand_prints_version() {
    sempsync()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn backup_without_config_fails() {
    sempsync()
        .arg("backup")
        .env_remove("SEMPSYNC_CONFIG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no configuration file"));
}

#[test]
fn backup_with_missing_config_file_fails() {
    sempsync()
        .args(["backup", "-c", "/nonexistent/config.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn restore_from_empty_store_fails_cleanly() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let empty_store = dir.path().join("store");
    std::fs::create_dir_all(&empty_store).expect("store dir");

    sempsync()
        .args(["restore", "-c"])
        .arg(&config)
        .arg("--from")
        .arg(&empty_store)
        .assert()
        .failure()
        .stderr(predicate::str::contains("run backup first"));
}

#[test]
fn provision_with_missing_input_fails() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    sempsync()
        .args(["provision", "-c"])
        .arg(&config)
        .args(["--input", "/nonexistent/queues.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn completions_generate_for_bash() {
    sempsync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sempsync"));
}

#[test]
fn restore_rejects_patch_and_delete_together() {
    sempsync()
        .args(["restore", "--patch", "--delete"])
        .assert()
        .failure();
}
