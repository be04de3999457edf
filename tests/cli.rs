// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sklearn-flow contributors

//! Command-line behaviour

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Binary running in an empty directory so no local config is picked up
fn sklearn_flow(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sklearn-flow").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn encode_titanic(dir: &TempDir) -> String {
    let output = sklearn_flow(dir)
        .arg("encode")
        .arg(fixture("titanic.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_encode_prints_flow() {
    let dir = TempDir::new().unwrap();

    sklearn_flow(&dir)
        .arg("encode")
        .arg(fixture("titanic.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"steps.3.output\""))
        .stdout(predicate::str::contains("sklearn.compose.ColumnTransformer"));
}

#[test]
fn test_encode_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("flow.json");

    sklearn_flow(&dir)
        .args(["encode", "--compact", "-o"])
        .arg(&out)
        .arg(fixture("titanic.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.trim_end().lines().count(), 1);
}

#[test]
fn test_encode_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    sklearn_flow(&dir)
        .args(["encode", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Pipeline file not found"));
}

#[test]
fn test_decode_from_stdin() {
    let dir = TempDir::new().unwrap();
    let flow = encode_titanic(&dir);

    sklearn_flow(&dir)
        .arg("decode")
        .write_stdin(flow)
        .assert()
        .success()
        .stdout(predicate::str::contains("class: sklearn.linear_model.LogisticRegression"))
        .stdout(predicate::str::contains("handle_unknown: ignore"));
}

#[test]
fn test_decode_unregistered_class_fails() {
    let dir = TempDir::new().unwrap();
    let flow = std::fs::read_to_string(fixture("linear.json"))
        .unwrap()
        .replace("sklearn.svm.SVC", "acme.models.Magic");

    sklearn_flow(&dir)
        .args(["decode", "-"])
        .write_stdin(flow)
        .assert()
        .failure()
        .stderr(predicate::str::contains("acme.models.Magic"));
}

#[test]
fn test_validate_fixture() {
    let dir = TempDir::new().unwrap();

    sklearn_flow(&dir)
        .arg("validate")
        .arg(fixture("linear.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Flow is valid!"));
}

#[test]
fn test_validate_broken_reference_fails() {
    let dir = TempDir::new().unwrap();
    let flow = std::fs::read_to_string(fixture("linear.json"))
        .unwrap()
        .replace("\"data\": \"steps.0.output\"", "\"data\": \"steps.7.output\"");

    sklearn_flow(&dir)
        .args(["validate", "--no-schema"])
        .write_stdin(flow)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Errors:"));
}

#[test]
fn test_graph_mermaid() {
    let dir = TempDir::new().unwrap();
    let flow = encode_titanic(&dir);

    sklearn_flow(&dir)
        .args(["graph", "--format", "mermaid"])
        .write_stdin(flow)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph TD"))
        .stdout(predicate::str::contains("-->|transformers|"));
}

#[test]
fn test_fingerprint_ignores_ids() {
    let dir = TempDir::new().unwrap();
    let digest = |flow: String| {
        let output = sklearn_flow(&dir)
            .arg("fingerprint")
            .write_stdin(flow)
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    };

    let first = digest(encode_titanic(&dir));
    let second = digest(encode_titanic(&dir));

    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(first, second);
}

#[test]
fn test_config_library_version() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".sklearn-flow.yaml"),
        "library_version: 1.3.0\n",
    )
    .unwrap();

    sklearn_flow(&dir)
        .args(["encode", "--compact"])
        .arg(fixture("titanic.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\":\"1.3.0\""));
}
