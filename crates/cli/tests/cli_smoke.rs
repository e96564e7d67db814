//! CLI smoke tests for ndkpack.
//!
//! These tests check argument handling, exit codes and the commands that do
//! not need an NDK. Nothing here spawns cargo.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the ndkpack binary with no NDK visible.
fn ndkpack_cmd(home: &TempDir) -> Command {
  let mut cmd = cargo_bin_cmd!("ndkpack");
  cmd
    .env_remove("ANDROID_NDK_HOME")
    .env_remove("ANDROID_NDK_ROOT")
    .env_remove("ANDROID_SDK_ROOT")
    .env_remove("TERMUX_VERSION")
    .env_remove("RUST_LOG")
    .env("HOME", home.path())
    .env("USERPROFILE", home.path());
  cmd
}

/// Create a temp project directory with an optional manifest.
fn temp_project(manifest: Option<&str>) -> TempDir {
  let temp = TempDir::new().unwrap();
  if let Some(content) = manifest {
    std::fs::write(temp.path().join("ndkpack.toml"), content).unwrap();
  }
  temp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  let home = TempDir::new().unwrap();
  ndkpack_cmd(&home)
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  let home = TempDir::new().unwrap();
  ndkpack_cmd(&home)
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("ndkpack"));
}

#[test]
fn subcommand_help_works() {
  let home = TempDir::new().unwrap();
  for cmd in &["build", "format", "lint", "update", "info"] {
    ndkpack_cmd(&home)
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn build_help_lists_flags() {
  let home = TempDir::new().unwrap();
  ndkpack_cmd(&home)
    .args(["build", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--release"))
    .stdout(predicate::str::contains("--no-default-features"))
    .stdout(predicate::str::contains("--nightly"));
}

// =============================================================================
// Argument errors
// =============================================================================

#[test]
fn release_and_debug_conflict() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--release", "--debug"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("conflicting build arguments"))
    .stderr(predicate::str::contains("Usage"));

  assert!(!project.path().join("output").exists());
}

#[test]
fn clean_with_release_conflicts() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--clean", "-r"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("--clean"));
}

#[test]
fn build_without_action_fails() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--nightly"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("missing build task"));
}

#[test]
fn blank_feature_is_rejected() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--debug", "--features", "use_binder,"])
    .assert()
    .code(2)
    .stderr(predicate::str::contains("invalid feature name"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
  let home = TempDir::new().unwrap();
  ndkpack_cmd(&home).args(["build", "--bogus"]).assert().code(2);
}

// =============================================================================
// Configuration errors
// =============================================================================

#[test]
fn missing_ndk_fails_with_status_one() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--release"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no Android NDK found"));

  assert!(!project.path().join("output").exists());
}

#[test]
fn invalid_manifest_fails_with_status_one() {
  let home = TempDir::new().unwrap();
  let project = temp_project(Some("[package]\nnmae = \"typo\"\n"));

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .args(["build", "--debug"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("invalid project manifest"));
}

// =============================================================================
// Info
// =============================================================================

#[test]
fn info_shows_platform_and_project() {
  let home = TempDir::new().unwrap();
  let project = temp_project(Some("[package]\nname = \"fas-rs\"\n"));

  ndkpack_cmd(&home)
    .arg("--project")
    .arg(project.path())
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("Platform"))
    .stdout(predicate::str::contains("fas-rs"))
    .stderr(predicate::str::contains("no Android NDK found"));
}

#[test]
fn info_reports_termux_toolchain() {
  let home = TempDir::new().unwrap();
  let project = temp_project(None);

  ndkpack_cmd(&home)
    .env("TERMUX_VERSION", "0.118.0")
    .arg("--project")
    .arg(project.path())
    .arg("info")
    .assert()
    .success()
    .stdout(predicate::str::contains("Termux"))
    .stdout(predicate::str::contains("Resolved for"))
    .stdout(predicate::str::contains("clang++"));
}
