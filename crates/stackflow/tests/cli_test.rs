#![allow(deprecated)] // TODO: migrate cargo_bin to the cargo_bin_cmd! macro

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// Command isolated from any configuration on the host
fn stackflow(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stackflow").unwrap();
    cmd.current_dir(dir)
        .env_remove("STACKFLOW_CONFIG_PATH")
        .env_remove("STACKFLOW_NAMESPACE")
        .env_remove("RUST_LOG")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("AWS_REGION", "us-east-1")
        .env("AWS_EC2_METADATA_DISABLED", "true");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("env"))
        .stdout(predicate::str::contains("svc"))
        .stdout(predicate::str::contains("db"))
        .stdout(predicate::str::contains("pipeline"))
        .stdout(predicate::str::contains("templates"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "stackflow {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_svc_deploy_help() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["svc", "deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<ENVIRONMENT>"))
        .stdout(predicate::str::contains("--revision"));
}

#[test]
fn test_templates_list_without_config() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudformation/vpc.yml"))
        .stdout(predicate::str::contains("codebuild/buildspec.yml"))
        .stdout(predicate::str::contains("policies/default.json"));
}

#[test]
fn test_templates_list_prefix() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["templates", "list", "--prefix", "policies/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("policies/allow-all.json"))
        .stdout(predicate::str::contains("cloudformation/").not());
}

#[test]
fn test_templates_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    let overrides = dir.path().join("overrides");
    fs::create_dir_all(overrides.join("cloudformation")).unwrap();
    fs::write(
        overrides.join("cloudformation/vpc.yml"),
        "Description: custom network\n",
    )
    .unwrap();
    fs::write(overrides.join("cloudformation/extra.yml"), "Resources: {}\n").unwrap();

    stackflow(dir.path())
        .args(["templates", "list", "--templates-dir"])
        .arg(&overrides)
        .assert()
        .success()
        .stdout(predicate::str::contains("cloudformation/extra.yml"));

    stackflow(dir.path())
        .args(["templates", "show", "cloudformation/vpc.yml", "--templates-dir"])
        .arg(&overrides)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom network"));
}

#[test]
fn test_templates_show_rendered() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["templates", "show", "cloudformation/vpc.yml", "--rendered"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AWSTemplateFormatVersion"))
        .stdout(predicate::str::contains("{{").not());
}

#[test]
fn test_templates_show_unknown() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["templates", "show", "cloudformation/nope.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Template not found: cloudformation/nope.yml",
        ));
}

#[test]
fn test_workflow_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["env", "upsert", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_database_requires_build_bucket() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("stackflow.yml"),
        "repo:\n  name: orders-repo\n",
    )
    .unwrap();

    stackflow(dir.path())
        .args(["db", "upsert", "dev"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("database upsert"))
        .stderr(predicate::str::contains(
            "Pipeline build bucket must be provided",
        ));
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    stackflow(dir.path())
        .args(["templates", "list", "--config", "missing.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yml"));
}
