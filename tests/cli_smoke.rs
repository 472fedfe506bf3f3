//! End-to-end runs of the `multirepo` binary on local workspaces.
//!
//! None of these reach the network: they cover the commands that only
//! touch the workspace on disk.

mod common;

use assert_cmd::Command;
use common::test_helpers::{single_store_workspace, write_file};
use predicates::prelude::*;
use tempfile::TempDir;

fn multirepo_cmd() -> Command {
    let mut cmd = Command::cargo_bin("multirepo").unwrap();
    cmd.env_remove("MULTIREPO_WORKSPACE")
        .env_remove("MULTIREPO_JOBS")
        .env_remove("MULTIREPO_CLONE_TIMEOUT")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn test_help_lists_commands() {
    multirepo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("artifacts"));
}

#[test]
fn test_single_store_backend_and_list() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .arg("backend")
        .assert()
        .success()
        .stdout(predicate::str::contains("single store at"));

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Single-store workspace"));
}

#[test]
fn test_migrate_switches_backend() {
    let workspace = single_store_workspace();
    let root = workspace.path();

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved"));

    assert!(root.join("repositories.json").is_file());
    assert!(root.join("workspace/README.md").is_file());
    assert!(!root.join("README.md").exists());

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .arg("backend")
        .assert()
        .success()
        .stdout(predicate::str::contains("composite of 1 stores"));

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("already uses the composite layout"));

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .args(["list", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"present\": true"));
}

#[test]
fn test_resolve_on_single_store_does_nothing() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .arg("resolve")
        .assert()
        .success();

    assert!(!workspace.path().join("repositories.json").exists());
}

#[test]
fn test_artifacts_and_show() {
    let workspace = single_store_workspace();
    let root = workspace.path();
    write_file(root, "nodetypes/web/files/run.sh", "echo run");

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .args(["artifacts", "--output", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nodetypes/web/files/run.sh"))
        .stdout(predicate::str::contains(".git/HEAD").not());

    multirepo_cmd()
        .arg("-C")
        .arg(root)
        .args(["show", "nodetypes/web/files/run.sh"])
        .assert()
        .success()
        .stdout("echo run");
}

#[test]
fn test_show_missing_artifact_fails() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .args(["show", "nodetypes/none.tosca"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_show_rejects_escaping_id() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .args(["show", "../outside"])
        .assert()
        .failure();
}

#[test]
fn test_workspace_from_environment() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .env("MULTIREPO_WORKSPACE", workspace.path())
        .args(["show", "README.md"])
        .assert()
        .success()
        .stdout("models");
}

#[test]
fn test_zero_jobs_is_rejected() {
    let workspace = single_store_workspace();

    multirepo_cmd()
        .arg("-C")
        .arg(workspace.path())
        .args(["--jobs", "0", "backend"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_workspace_is_an_error() {
    let temp_dir = TempDir::new().unwrap();

    multirepo_cmd()
        .arg("-C")
        .arg(temp_dir.path().join("absent"))
        .arg("backend")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open workspace"));
}

#[test]
fn test_add_requires_a_url() {
    multirepo_cmd().arg("add").assert().failure();
}
