use std::fs;

use predicates::prelude::*;
use serde_json::Value;

use super::common::TestEnv;

#[test]
fn build_writes_archive_and_checksum() {
  let env = TestEnv::new();
  env.publish("1.0");
  env.publish("1.1-rc1");
  env.publish("1.2");

  env
    .distpack_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Distribution built"))
    .stdout(predicate::str::contains("1.2"));

  let archive = env.archive_path("1.2");
  assert!(archive.exists());
  let checksum = fs::read_to_string(env.output_path().join("dist-1.2-bin.zip.sha256")).unwrap();
  assert_eq!(checksum.len(), 64);
  assert!(env.output_path().join("src/gradle-1.2/init.d/init.cfg").exists());
}

#[test]
fn second_build_is_up_to_date() {
  let env = TestEnv::new();
  env.publish("1.2");

  env.distpack_cmd().arg("build").assert().success();
  let before = fs::read(env.archive_path("1.2")).unwrap();

  env
    .distpack_cmd()
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("Distribution up to date"))
    .stdout(predicate::str::contains("up-to-date"));

  assert_eq!(fs::read(env.archive_path("1.2")).unwrap(), before);
}

#[test]
fn rerun_executes_every_stage() {
  let env = TestEnv::new();
  env.publish("1.2");
  env.distpack_cmd().arg("build").assert().success();

  let output = env
    .distpack_cmd()
    .args(["build", "--rerun", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: Value = serde_json::from_slice(&output.stdout).unwrap();
  let stages = report["stages"].as_array().unwrap();
  assert_eq!(stages.len(), 3);
  assert!(stages.iter().all(|s| s["status"] == "executed"));
}

#[test]
fn build_json_output_is_valid() {
  let env = TestEnv::new();
  env.publish("1.2");

  let output = env.distpack_cmd().args(["build", "-o", "json"]).output().unwrap();

  assert!(output.status.success());
  let report: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["version"], "1.2");
  assert_eq!(report["digest"].as_str().unwrap().len(), 64);
}

#[test]
fn build_with_no_candidates_fails() {
  let env = TestEnv::new();

  env
    .distpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to resolve distribution"));

  assert!(!env.archive_path("1.2").exists());
}

#[test]
fn build_with_two_top_level_directories_fails() {
  let env = TestEnv::new();
  env.publish_entries("1.2", &[("one/a", b"a"), ("two/b", b"b")]);

  env
    .distpack_cmd()
    .arg("build")
    .assert()
    .failure()
    .stderr(predicate::str::contains("compose"));

  assert!(!env.archive_path("1.2").exists());
}

#[test]
fn clean_removes_output_directory() {
  let env = TestEnv::new();
  env.publish("1.2");
  env.distpack_cmd().arg("build").assert().success();

  env
    .distpack_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));

  assert!(!env.output_path().exists());
}

#[test]
fn output_dir_env_overrides_config() {
  let env = TestEnv::new();
  env.publish("1.2");
  let elsewhere = env.temp.path().join("elsewhere");

  env
    .distpack_cmd()
    .env("DISTPACK_OUTPUT_DIR", &elsewhere)
    .arg("build")
    .assert()
    .success();

  assert!(elsewhere.join("dist-1.2-bin.zip").exists());
  assert!(!env.archive_path("1.2").exists());
}
