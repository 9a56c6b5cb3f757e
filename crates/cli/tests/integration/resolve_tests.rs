use predicates::prelude::*;
use serde_json::Value;

use super::common::TestEnv;

#[test]
fn resolve_prints_newest_stable_version() {
  let env = TestEnv::new();
  env.publish("1.0");
  env.publish("1.2");
  env.publish("1.3-rc1");

  env
    .distpack_cmd()
    .arg("resolve")
    .assert()
    .success()
    .stdout(predicate::str::contains("resolves to 1.2"))
    .stdout(predicate::str::contains("dist-1.2-bin.zip"));

  assert!(!env.output_path().exists());
}

#[test]
fn resolve_json_output_is_valid() {
  let env = TestEnv::new();
  env.publish("1.2");

  let output = env.distpack_cmd().args(["resolve", "-o", "json"]).output().unwrap();

  assert!(output.status.success());
  let result: Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(result["version"], "1.2");
  assert_eq!(result["coordinate"], "gradle:bin:+@zip");
  assert_eq!(result["archive"], "dist-1.2-bin.zip");
}

#[test]
fn resolve_with_only_rejected_versions_fails() {
  let env = TestEnv::new();
  env.publish("1.3-rc1");

  env.distpack_cmd().arg("resolve").assert().failure();
}
