//! CLI surface tests.
//!
//! These run the real binary with `HOME` pointed at a temp directory, so
//! every path stops before the first cloud call.

#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn dockhost() -> Command {
    Command::cargo_bin("dockhost").expect("binary built")
}

/// Write a valid config plus the required cert hook under `<home>/.dockhost`.
fn seed_home(home: &Path) {
    let dir = home.join(".dockhost");
    std::fs::create_dir_all(&dir).expect("config dir");
    std::fs::write(
        dir.join("config.json"),
        r#"{
            "Region": "us-east-1",
            "VpcId": "vpc-1",
            "SubnetIds": ["subnet-1", "subnet-2"],
            "SecurityGroups": ["sg-client"],
            "EfsIpAddress": "10.0.0.5",
            "MountTargetId": "fsmt-1",
            "UserUid": "200001",
            "ImageId": "ami-1"
        }"#,
    )
    .expect("config file");
    std::fs::write(
        dir.join("create-certs.sh"),
        "#!/bin/bash\n_tls_generate_certs() { true; }\n",
    )
    .expect("cert hook");
}

#[test]
fn help_lists_the_three_commands() {
    dockhost()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create-host"))
        .stdout(predicate::str::contains("terminate-current-host"))
        .stdout(predicate::str::contains("terminate-host"));
}

#[test]
fn version_flag_prints_the_crate_version() {
    dockhost()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn no_arguments_shows_help_and_fails() {
    dockhost()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn create_host_requires_instance_type() {
    dockhost()
        .arg("create-host")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--instance-type"));
}

#[test]
fn terminate_host_requires_instance_id() {
    dockhost()
        .args(["terminate-host"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--instance-id"));
}

#[test]
fn create_host_rejects_a_subnet_outside_the_configured_set() {
    let home = tempfile::tempdir().expect("tempdir");
    seed_home(home.path());
    dockhost()
        .env("HOME", home.path())
        .env_remove("DOCKHOST_CONFIG")
        .args([
            "create-host",
            "--instance-type",
            "m5.large",
            "--subnet-id",
            "subnet-9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidSubnetId"))
        .stderr(predicate::str::contains("subnet-9"));
}

#[test]
fn create_host_without_config_reports_the_missing_file() {
    let home = tempfile::tempdir().expect("tempdir");
    dockhost()
        .env("HOME", home.path())
        .env_remove("DOCKHOST_CONFIG")
        .args(["create-host", "--instance-type", "m5.large"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.json"));
}

#[test]
fn terminate_current_host_without_state_reports_no_active_host() {
    let home = tempfile::tempdir().expect("tempdir");
    seed_home(home.path());
    dockhost()
        .env("HOME", home.path())
        .env_remove("DOCKHOST_CONFIG")
        .arg("terminate-current-host")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active host recorded"));
}

#[test]
fn config_env_override_is_honored() {
    let home = tempfile::tempdir().expect("tempdir");
    seed_home(home.path());
    let override_path = home.path().join("elsewhere.json");
    std::fs::write(&override_path, "{}").expect("override config");
    dockhost()
        .env("HOME", home.path())
        .env("DOCKHOST_CONFIG", &override_path)
        .args(["create-host", "--instance-type", "m5.large"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("elsewhere.json"));
}
