//! CLI integration tests
//!
//! Drives the ferry binary end-to-end for the parts that do not need a live
//! host: help output, argument validation, and local-side failure paths.

use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper to run ferry CLI commands
fn run_ferry(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ferry"))
        .args(args)
        .current_dir(cwd)
        .env_remove("FERRY_HOST")
        .env_remove("FERRY_USER")
        .env_remove("FERRY_KEY")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to run ferry command")
}

#[test]
fn help_lists_subcommands() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(&["--help"], tmp.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    for cmd in ["push", "send", "fetch", "run", "keys"] {
        assert!(stdout.contains(cmd), "help should mention {cmd}: {stdout}");
    }
}

#[test]
fn version_flag_prints_version() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(&["--version"], tmp.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.trim().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_fails() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(&["teleport"], tmp.path());
    assert!(!out.status.success());
}

#[test]
fn send_requires_host_and_user() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(&["send", "a.txt", "/remote"], tmp.path());
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--host") || stderr.contains("--user"), "{stderr}");
}

#[test]
fn send_rejects_missing_local_file() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(
        &["send", "-H", "example.invalid", "-u", "stan", "missing.txt", "/remote"],
        tmp.path(),
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn push_rejects_invalid_json() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("broken.json"), "{not json").unwrap();
    let out = run_ferry(
        &["push", "-H", "example.invalid", "-u", "stan", "broken.json", "/remote"],
        tmp.path(),
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("not valid JSON"), "{stderr}");
}

#[test]
fn run_rejects_missing_staged_script() {
    let tmp = TempDir::new().unwrap();
    let out = run_ferry(
        &[
            "run",
            "-H",
            "example.invalid",
            "-u",
            "stan",
            "--stage",
            "missing.py",
            "/remote/run.py",
        ],
        tmp.path(),
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does not exist"), "{stderr}");
}

#[test]
fn keys_install_rejects_missing_key_file() {
    let tmp = TempDir::new().unwrap();
    let missing_key = tmp.path().join("no_such_key");
    let out = run_ferry(
        &[
            "keys",
            "install",
            "-H",
            "example.invalid",
            "-u",
            "stan",
            "-i",
            missing_key.to_str().unwrap(),
        ],
        tmp.path(),
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("key"), "{stderr}");
}
