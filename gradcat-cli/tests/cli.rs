//! CLI smoke tests against a minimal legacy project.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn gradcat() -> Command {
    Command::cargo_bin("gradcat").expect("gradcat binary")
}

fn create_legacy_project() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();

    fs::write(
        root.join("settings.gradle"),
        "pluginManagement {\n}\nrootProject.name = 'demo'\ninclude ':app'\n",
    )
    .unwrap();
    fs::write(
        root.join("build.gradle"),
        "ext {\n    slf4jVersion = '1.7.36'\n}\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("app")).unwrap();
    fs::write(
        root.join("app").join("build.gradle"),
        "plugins {\n    id 'java'\n}\ndependencies {\n    implementation \"org.slf4j:slf4j-api:${slf4jVersion}\"\n}\n",
    )
    .unwrap();

    td
}

#[test]
fn migrate_writes_artifacts_and_narrative() {
    let temp = create_legacy_project();

    gradcat()
        .current_dir(temp.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration completed."));

    let out = temp.path().join(".gradcat");
    for artifact in ["summary.json", "report.json", "modules.json", "patch.diff", "summary.md"] {
        assert!(out.join(artifact).exists(), "missing {artifact}");
    }
    assert!(temp.path().join("gradle/libs.versions.toml").exists());
    assert!(!temp.path().join("build.gradle").exists());
}

#[test]
fn dry_run_leaves_the_project_alone() {
    let temp = create_legacy_project();

    gradcat()
        .current_dir(temp.path())
        .args(["migrate", "--dry-run"])
        .assert()
        .success();

    assert!(temp.path().join("build.gradle").exists());
    assert!(!temp.path().join("gradle/libs.versions.toml").exists());
    // Artifacts are still produced.
    assert!(temp.path().join(".gradcat/patch.diff").exists());
}

#[test]
fn scan_emits_module_json() {
    let temp = create_legacy_project();

    gradcat()
        .current_dir(temp.path())
        .args(["scan", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"plugins\""));
}

#[test]
fn missing_project_root_fails() {
    gradcat()
        .args(["migrate", "--project-root", "/definitely/not/here"])
        .assert()
        .failure();
}

#[test]
fn push_requires_branch() {
    gradcat()
        .args(["migrate", "--push"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--branch"));
}
