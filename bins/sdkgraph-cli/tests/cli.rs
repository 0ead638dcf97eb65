// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn demo(name: &str) -> String {
    format!("{}/demos/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn sdkgraph(config_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sdkgraph").unwrap();
    cmd.arg("--config-dir").arg(config_dir.path());
    cmd
}

#[test]
fn pinned_bundle_prints_the_rewired_graph() {
    let dir = tempfile::tempdir().unwrap();
    let out = sdkgraph(&dir)
        .args(["--format", "json", "--serial"])
        .arg(demo("pinned_bundle.json"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["succeeded"], true);
    let com_a = json["modules"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == "com.a")
        .unwrap();
    assert_eq!(com_a["deps"][0]["to"], "mysdk_libfoo@11");
    assert_eq!(json["snapshots"][0]["sdk"], "mysdk");
}

#[test]
fn requirement_violation_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    sdkgraph(&dir)
        .arg(demo("version_mismatch.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("libconsumer").and(predicate::str::contains("mysdk@12")));
}

#[test]
fn save_config_persists_overrides() {
    let dir = tempfile::tempdir().unwrap();
    sdkgraph(&dir)
        .args(["--save-config", "--workers", "2", "--fail-fast"])
        .arg(demo("pinned_bundle.json"))
        .assert()
        .success();

    let saved = std::fs::read_to_string(dir.path().join("sdkgraph.json")).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(saved["workers"], 2);
    assert_eq!(saved["fail_fast"], true);
}

#[test]
fn missing_manifest_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    sdkgraph(&dir)
        .arg(demo("does_not_exist.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist.json"));
}
