//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `blueprint` binary and verify exit
//! codes, stdout content, and stderr content.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn blueprint() -> Command {
    Command::cargo_bin("blueprint").expect("binary exists")
}

fn write_workspace(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("workspace.dsl");
    fs::write(
        &path,
        r#"workspace "Example" "A workspace" {
    model {
        u = person "User"
        s = softwareSystem "S"
        u -> s "Uses"
    }
    views {
        systemContext s "c" {
            include *
            autoLayout
        }
    }
}"#,
    )
    .unwrap();
    path
}

#[test]
fn help_exits_0_with_description() {
    blueprint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Blueprint architecture DSL toolchain",
        ));
}

#[test]
fn version_exits_0() {
    blueprint()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("blueprint"));
}

#[test]
fn parse_emits_workspace_json() {
    let dir = TempDir::new().unwrap();
    let path = write_workspace(&dir);
    let output = blueprint()
        .arg("parse")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["name"], "Example");
    assert_eq!(json["views"]["views"][0]["key"], "c");
}

#[test]
fn parse_writes_to_an_output_file() {
    let dir = TempDir::new().unwrap();
    let path = write_workspace(&dir);
    let out = dir.path().join("workspace.json");
    blueprint()
        .arg("parse")
        .arg(&path)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["name"], "Example");
}

#[test]
fn check_reports_a_summary() {
    let dir = TempDir::new().unwrap();
    let path = write_workspace(&dir);
    blueprint()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 elements"))
        .stdout(predicate::str::contains("1 relationships"))
        .stdout(predicate::str::contains("1 views"));
}

#[test]
fn invalid_input_exits_nonzero_with_provenance() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.dsl");
    fs::write(&path, "workspace {\n    mdel {\n    }\n}").unwrap();
    blueprint()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unexpected tokens"))
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn missing_file_exits_nonzero() {
    blueprint()
        .arg("check")
        .arg("does-not-exist.dsl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn restricted_mode_rejects_scripts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scripted.dsl");
    fs::write(
        &path,
        "workspace {\n    !script groovy {\n        x\n    }\n}",
    )
    .unwrap();
    blueprint()
        .arg("--restricted")
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Scripts are not available"));
}
