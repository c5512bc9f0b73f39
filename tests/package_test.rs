mod common;

use common::bin;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const TS: &str = "Jan 01 202500:00:00";

fn write_project(root: &Path, header: &str) -> PathBuf {
    let config_dir = root.join("src/config");
    fs::create_dir_all(&config_dir).expect("mkdir config");
    fs::write(config_dir.join("AppConfig.h"), header).expect("write header");

    let build_dir = root.join(".pio/build/esp32dev");
    fs::create_dir_all(&build_dir).expect("mkdir build");
    let artifact = build_dir.join("firmware.bin");
    fs::write(&artifact, b"\xe9\x06firmware").expect("write artifact");
    artifact
}

fn dist_entries(root: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(root.join("dist")) else {
        return Vec::new();
    };
    let mut names = entries
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}

fn generate_build_id(root: &Path) {
    bin(root)
        .current_dir(root)
        .args(["build-id", "--timestamp", TS])
        .assert()
        .success();
}

#[test]
fn package_names_artifact_after_release_and_build_id() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"2.3.1\"\n");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("firmware copied to: dist/spojboard-r2.3.1-c8b75ffc.bin"))
        .stdout(contains("release=2.3.1"))
        .stdout(contains("build_id=c8b75ffc"));

    assert_eq!(dist_entries(tmp.path()), vec!["spojboard-r2.3.1-c8b75ffc.bin"]);
    let copied = fs::read(tmp.path().join("dist/spojboard-r2.3.1-c8b75ffc.bin")).expect("read");
    assert_eq!(copied, b"\xe9\x06firmware");
}

#[test]
fn missing_release_define_uses_unknown_and_still_succeeds() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#pragma once\n#define OTHER 1\n");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stderr(contains("SPOJBOARD_WARN code=RELEASE_NOT_FOUND"));

    assert_eq!(dist_entries(tmp.path()), vec!["spojboard-runknown-c8b75ffc.bin"]);
}

#[test]
fn package_without_build_context_uses_unknown_build_id() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"5\"\n");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("build_id_source=fallback"))
        .stderr(contains("SPOJBOARD_WARN code=BUILD_ID_MISSING"));

    assert_eq!(dist_entries(tmp.path()), vec!["spojboard-r5-unknown.bin"]);
}

#[test]
fn missing_artifact_fails_and_writes_nothing() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"1\"\n");
    fs::remove_file(&artifact).expect("rm artifact");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(contains("failed to copy artifact"))
        .stderr(contains("artifact not found"));

    assert!(dist_entries(tmp.path()).is_empty());

    let audit = fs::read_to_string(tmp.path().join(".spojboard/audit.log")).expect("audit");
    assert!(audit.contains("\"status\":\"COPY_ERROR\""));
}

#[test]
fn missing_config_header_aborts_packaging() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "");
    fs::remove_file(tmp.path().join("src/config/AppConfig.h")).expect("rm header");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(contains("config header not found"))
        .stderr(contains("AppConfig.h"));

    assert!(dist_entries(tmp.path()).is_empty());
}

#[test]
fn repackaging_same_build_overwrites_previous_artifact() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"1\"\n");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("overwrote=false"));

    fs::write(&artifact, b"second build").expect("rewrite");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stdout(contains("overwrote=true"));

    assert_eq!(dist_entries(tmp.path()), vec!["spojboard-r1-c8b75ffc.bin"]);
    let copied = fs::read(tmp.path().join("dist/spojboard-r1-c8b75ffc.bin")).expect("read");
    assert_eq!(copied, b"second build");
}

#[test]
fn no_clobber_refuses_existing_artifact() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"1\"\n");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--no-clobber")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(contains("artifact already exists"));
}

#[test]
fn corrupt_build_context_is_fatal() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"1\"\n");
    fs::create_dir_all(tmp.path().join(".spojboard")).expect("mkdir state");
    fs::write(tmp.path().join(".spojboard/build_context.json"), "{oops").expect("write");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(contains("is corrupt").and(contains("build_context.json")));

    assert!(dist_entries(tmp.path()).is_empty());
}

#[test]
fn project_dir_flag_points_at_another_tree() {
    let tmp = tempdir().expect("tempdir");
    let project = tmp.path().join("firmware");
    let artifact = write_project(&project, "#define FIRMWARE_RELEASE \"3\"\n");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("--project-dir")
        .arg(&project)
        .args(["build-id", "--timestamp", TS])
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("--project-dir")
        .arg(&project)
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success();

    assert_eq!(dist_entries(&project), vec!["spojboard-r3-c8b75ffc.bin"]);
    assert!(!tmp.path().join("dist").exists());
}

#[test]
fn no_save_build_id_discards_previous_context() {
    let tmp = tempdir().expect("tempdir");
    let artifact = write_project(tmp.path(), "#define FIRMWARE_RELEASE \"1\"\n");
    generate_build_id(tmp.path());

    bin(tmp.path())
        .current_dir(tmp.path())
        .args([
            "build-id",
            "--timestamp",
            "Feb 02 202611:11:11",
            "--format",
            "env",
            "--no-save",
        ])
        .assert()
        .success()
        .stdout("FIRMWARE_BUILD_ID=c47b18b8\n");
    assert!(!tmp.path().join(".spojboard/build_context.json").exists());

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("package")
        .arg("--artifact")
        .arg(&artifact)
        .assert()
        .success()
        .stderr(contains("SPOJBOARD_WARN code=BUILD_ID_MISSING"));

    assert_eq!(dist_entries(tmp.path()), vec!["spojboard-r1-unknown.bin"]);
}

#[test]
fn relative_artifact_is_taken_from_project_dir() {
    let tmp = tempdir().expect("tempdir");
    let project = tmp.path().join("fw");
    write_project(&project, "#define FIRMWARE_RELEASE \"2\"\n");

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("--project-dir")
        .arg(&project)
        .args(["build-id", "--timestamp", TS])
        .assert()
        .success();

    bin(tmp.path())
        .current_dir(tmp.path())
        .arg("--project-dir")
        .arg(&project)
        .args(["package", "--artifact", ".pio/build/esp32dev/firmware.bin"])
        .assert()
        .success()
        .stdout(contains("source=.pio/build/esp32dev/firmware.bin"));

    assert_eq!(dist_entries(&project), vec!["spojboard-r2-c8b75ffc.bin"]);
}
