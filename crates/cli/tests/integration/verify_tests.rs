use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn verify_accepts_fresh_build() {
  let env = TestEnv::new();
  env.publish("1.2");
  env.distpack_cmd().arg("build").assert().success();

  env
    .distpack_cmd()
    .arg("verify")
    .assert()
    .success()
    .stdout(predicate::str::contains("dist-1.2-bin.zip"));
}

#[test]
fn verify_detects_modified_archive() {
  let env = TestEnv::new();
  env.publish("1.2");
  env.distpack_cmd().arg("build").assert().success();
  fs::write(env.archive_path("1.2"), b"tampered").unwrap();

  env
    .distpack_cmd()
    .arg("verify")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed verification"));
}

#[test]
fn verify_reports_missing_archive() {
  let env = TestEnv::new();
  env.publish("1.2");
  env.distpack_cmd().arg("build").assert().success();
  fs::remove_file(env.archive_path("1.2")).unwrap();

  env
    .distpack_cmd()
    .arg("verify")
    .assert()
    .failure()
    .stderr(predicate::str::contains("archive missing"));
}

#[test]
fn verify_without_build_fails() {
  let env = TestEnv::new();
  fs::create_dir_all(env.output_path()).unwrap();

  env
    .distpack_cmd()
    .arg("verify")
    .assert()
    .failure()
    .stderr(predicate::str::contains("No checksum files"));
}
