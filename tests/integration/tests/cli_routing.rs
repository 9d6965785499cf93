//! CLI binary integration tests.
//!
//! These tests exercise the compiled `keyward` binary: command routing, help
//! text, and a full import/sign flow against a temporary config.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use keyward_integration_tests::{exported_json, TestEnv};

/// Locate the compiled `keyward` binary in the workspace target directory.
fn keyward_bin() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // tests/integration -> workspace root
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root");
    let bin = workspace_root.join("target").join("debug").join("keyward");
    assert!(
        bin.exists(),
        "keyward binary not found at {}; run `cargo build -p keyward-cli` first",
        bin.display()
    );
    bin
}

fn keyward_cmd(env: &TestEnv) -> Command {
    let mut cmd = Command::new(keyward_bin());
    cmd.env("KEYWARD_CONFIG", env.config_path())
        .env("KEYWARD_TEST_PASSWORD", "p1")
        .env_remove("RUST_LOG");
    cmd
}

fn run(env: &TestEnv, args: &[&str]) -> Output {
    keyward_cmd(env)
        .args(args)
        .output()
        .expect("failed to run keyward")
}

fn import(env: &TestEnv, seed: u8) -> Output {
    let mut child = keyward_cmd(env)
        .args(["import", "--password-env", "KEYWARD_TEST_PASSWORD", "--select"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run keyward");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(exported_json(seed).as_bytes())
        .expect("write key");
    child.wait_with_output().expect("wait for keyward")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_cli_version() {
    let env = TestEnv::new();
    let output = run(&env, &["version"]);
    assert!(output.status.success(), "version command should succeed");
    assert!(
        stdout(&output).contains("keyward"),
        "version output should contain 'keyward', got: {}",
        stdout(&output)
    );
}

#[test]
fn test_cli_help() {
    let env = TestEnv::new();
    let output = run(&env, &["--help"]);
    assert!(output.status.success(), "--help should succeed");
    let help = stdout(&output);
    for command in ["import", "list", "sign", "verify-password", "remove", "config"] {
        assert!(help.contains(command), "help should mention '{command}', got: {help}");
    }
}

#[test]
fn test_cli_unknown_command() {
    let env = TestEnv::new();
    let output = run(&env, &["nonexistent-command"]);
    assert!(
        !output.status.success(),
        "unknown command should return non-zero exit code"
    );
}

#[test]
fn test_cli_list_empty() {
    let env = TestEnv::new();
    let output = run(&env, &["list", "--json"]);
    assert!(output.status.success());
    let accounts: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(accounts, serde_json::json!([]));
}

#[test]
fn test_cli_import_list_sign() {
    let env = TestEnv::new();

    let output = import(&env, 1);
    assert!(
        output.status.success(),
        "import failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run(&env, &["list", "--json"]);
    let accounts: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let account = &accounts[0];
    assert_eq!(account["isLocked"], true);
    assert_eq!(account["selected"], true);
    assert!(account.get("encrypted").is_none());

    let output = run(
        &env,
        &["sign", "010203", "--hex", "--password-env", "KEYWARD_TEST_PASSWORD"],
    );
    assert!(
        output.status.success(),
        "sign failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let signature = stdout(&output).trim().to_string();
    assert!(keyward_accounts::codec::verify_serialized_signature(
        &[1, 2, 3],
        &signature,
        account["publicKey"].as_str().unwrap()
    ));
}

#[test]
fn test_cli_wrong_password() {
    let env = TestEnv::new();
    assert!(import(&env, 2).status.success());

    let output = keyward_cmd(&env)
        .env("KEYWARD_TEST_PASSWORD", "nope")
        .args(["verify-password", "--password-env", "KEYWARD_TEST_PASSWORD"])
        .output()
        .expect("failed to run keyward");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Wrong password"));

    let output = run(&env, &["verify-password", "--password-env", "KEYWARD_TEST_PASSWORD"]);
    assert!(output.status.success());
}

#[test]
fn test_cli_remove_requires_confirmation() {
    let env = TestEnv::new();
    assert!(import(&env, 3).status.success());

    let output = run(&env, &["list", "--json"]);
    let accounts: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let id = accounts[0]["id"].as_str().unwrap().to_string();

    assert!(!run(&env, &["remove", &id]).status.success());
    assert!(run(&env, &["remove", &id, "--yes"]).status.success());

    let output = run(&env, &["list", "--json"]);
    let accounts: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(accounts, serde_json::json!([]));
}

#[test]
fn test_cli_config_get() {
    let env = TestEnv::new();
    let output = run(&env, &["config", "get", "cipher.iterations"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "1000");
}
