use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::tempdir;

mod common;

use common::parse_json;

fn stderr_text(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).to_string()
}

#[test]
fn missing_manifest_file_is_a_fatal_user_error() {
    let dir = tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("plugsync");
    let assert = cmd
        .args([
            "sync",
            "--manifest",
            &dir.path().join("absent.yml").display().to_string(),
            "--url",
            "https://www.example.com",
            "--path",
            &dir.path().display().to_string(),
        ])
        .assert()
        .failure()
        .code(1);
    let stderr = stderr_text(&assert);
    assert!(
        stderr.contains("could not be resolved"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn unresolvable_install_root_is_a_fatal_user_error() {
    let dir = tempdir().expect("tempdir");
    let manifest = dir.path().join("plugins.yml");
    std::fs::write(&manifest, "[]").expect("manifest");

    let mut cmd = cargo_bin_cmd!("plugsync");
    let assert = cmd
        .args([
            "sync",
            "--manifest",
            &manifest.display().to_string(),
            "--url",
            "https://www.example.com",
            "--path",
            &dir.path().join("not-a-dir").display().to_string(),
        ])
        .assert()
        .failure()
        .code(1);
    let stderr = stderr_text(&assert);
    assert!(
        stderr.contains("install root"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn empty_url_is_a_fatal_user_error() {
    let dir = tempdir().expect("tempdir");
    let manifest = dir.path().join("plugins.yml");
    std::fs::write(&manifest, "[]").expect("manifest");

    let mut cmd = cargo_bin_cmd!("plugsync");
    let assert = cmd
        .args([
            "sync",
            "--manifest",
            &manifest.display().to_string(),
            "--url",
            "",
            "--path",
            &dir.path().display().to_string(),
        ])
        .assert()
        .failure()
        .code(1);
    let stderr = stderr_text(&assert);
    assert!(
        stderr.contains("target url"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn missing_required_arguments_fail_at_parse_time() {
    let mut cmd = cargo_bin_cmd!("plugsync");
    cmd.arg("sync").assert().failure();
}

#[test]
fn fatal_errors_keep_the_json_contract() {
    let dir = tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("plugsync");
    let assert = cmd
        .args([
            "--json",
            "sync",
            "--manifest",
            &dir.path().join("absent.yml").display().to_string(),
            "--url",
            "https://www.example.com",
            "--path",
            &dir.path().display().to_string(),
        ])
        .assert()
        .failure()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["status"], "error");
    assert!(payload["message"]
        .as_str()
        .expect("message")
        .contains("could not be resolved"));
}
