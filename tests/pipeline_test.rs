mod common;

use common::bin;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_project(root: &Path, release: &str) -> PathBuf {
    let config_dir = root.join("src/config");
    fs::create_dir_all(&config_dir).expect("mkdir config");
    fs::write(
        config_dir.join("AppConfig.h"),
        format!("#ifndef APP_CONFIG_H\n#define APP_CONFIG_H\n#define FIRMWARE_RELEASE \"{release}\"\n#endif\n"),
    )
    .expect("write header");
    let artifact = root.join("firmware.bin");
    fs::write(&artifact, b"image").expect("write artifact");
    artifact
}

fn only_dist_entry(root: &Path) -> String {
    let names = fs::read_dir(root.join("dist"))
        .expect("dist exists")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names.len(), 1, "expected one artifact, got {names:?}");
    names[0].clone()
}

#[test]
fn pipeline_packages_with_fixed_timestamp() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "2.3.1");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("pipeline")
        .args(["--timestamp", "Jan 01 202500:00:00"])
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("command: pipeline"))
        .stdout(contains("dist/spojboard-r2.3.1-c8b75ffc.bin"));

    assert_eq!(only_dist_entry(tmp.path()), "spojboard-r2.3.1-c8b75ffc.bin");
}

#[test]
fn one_build_id_flows_into_defines_context_and_file_name() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "7");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("pipeline")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success();

    let raw = fs::read_to_string(tmp.path().join(".spojboard/build_context.json"))
        .expect("context");
    let ctx: serde_json::Value = serde_json::from_str(&raw).expect("json");
    let id = ctx["values"]["FIRMWARE_BUILD_ID"]
        .as_str()
        .expect("build id")
        .to_string();

    assert_eq!(ctx["defines"][0]["value"], format!("\"Build {id}\""));
    assert_eq!(ctx["defines"][1]["value"], format!("0x{id}"));
    assert_eq!(only_dist_entry(tmp.path()), format!("spojboard-r7-{id}.bin"));
}

#[test]
fn separate_package_after_pipeline_reuses_saved_build_id() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "1");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("pipeline")
        .args(["--timestamp", "Jan 01 202500:00:00"])
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("overwrote=true"));

    assert_eq!(only_dist_entry(tmp.path()), "spojboard-r1-c8b75ffc.bin");
}

#[test]
fn show_context_predicts_next_artifact_name() {
    let tmp = tempdir().expect("tempdir");
    write_project(tmp.path(), "2.0");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("show-context")
        .assert()
        .code(2)
        .stdout(contains("no build id"));

    bin(tmp.path())
        .current_dir(tmp.path())
        .args(["build-id", "--timestamp", "Jan 01 202500:00:00"])
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("show-context")
        .assert()
        .success()
        .stdout(contains("timestamp=Jan 01 202500:00:00"))
        .stdout(contains("next_artifact=spojboard-r2.0-c8b75ffc.bin"));
}

#[test]
fn show_context_name_matches_what_package_writes() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "2.3/beta");

    bin(tmp.path())
        .current_dir(tmp.path())
        .args(["build-id", "--timestamp", "Jan 01 202500:00:00"])
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("show-context")
        .assert()
        .success()
        .stdout(contains("next_artifact=spojboard-r2.3_beta-c8b75ffc.bin"));

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success();

    assert_eq!(only_dist_entry(tmp.path()), "spojboard-r2.3_beta-c8b75ffc.bin");
}
