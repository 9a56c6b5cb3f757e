//! End-to-end pipeline behaviour across separate runs.

use std::fs;

use distpack_lib::compose::{ComposeError, InjectedFile};
use distpack_lib::fingerprint::{FileStore, FingerprintStore};
use distpack_lib::pipeline::{ARCHIVE_STAGE, CHECKSUM_STAGE, COMPOSE_STAGE, PipelineError, PipelineOptions};
use distpack_lib::stage::{StageError, StageId, StageStatus};
use distpack_lib::util::hash::hash_bytes;

use super::common::{Workspace, entry_names, tree_files};

const TOOL: (&str, &[u8]) = ("root/bin/tool", b"#!/bin/sh\necho tool\n");

#[test]
fn end_to_end_scenario() {
  let ws = Workspace::new();
  ws.publish("1.0", &[TOOL]);
  ws.publish("1.1-rc1", &[TOOL]);
  ws.publish("1.2", &[TOOL]);
  let cfg = ws.write("init.cfg", "repositories { mavenCentral() }\n");

  let report = ws
    .build(&[InjectedFile::new(&cfg, "init.d/a.cfg")], PipelineOptions::default())
    .unwrap();

  assert_eq!(report.version, "1.2");
  assert_eq!(
    tree_files(&ws.out().join("src")),
    vec!["root/bin/tool", "root/init.d/a.cfg"]
  );

  assert_eq!(report.archive, ws.out().join("dist-gradle-1.2-bin.zip"));
  assert_eq!(entry_names(&report.archive), vec!["root/bin/tool", "root/init.d/a.cfg"]);

  let archive_bytes = fs::read(&report.archive).unwrap();
  let expected = hash_bytes(&archive_bytes);
  assert_eq!(report.checksum, ws.out().join("dist-gradle-1.2-bin.zip.sha256"));
  assert_eq!(fs::read_to_string(&report.checksum).unwrap(), expected.as_str());
  assert_eq!(report.digest, expected);
}

#[test]
fn second_run_with_unchanged_inputs_does_no_work() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let cfg = ws.write("init.cfg", "a");
  let injected = [InjectedFile::new(&cfg, "init.d/a.cfg")];

  let first = ws.build(&injected, PipelineOptions::default()).unwrap();
  let archive_before = fs::read(&first.archive).unwrap();
  let modified_before = fs::metadata(&first.archive).unwrap().modified().unwrap();

  let second = ws.build(&injected, PipelineOptions::default()).unwrap();

  assert_eq!(first.executed(), 3);
  assert_eq!(second.executed(), 0);
  assert!(second.stages.iter().all(|s| s.status == StageStatus::UpToDate));
  assert_eq!(fs::read(&second.archive).unwrap(), archive_before);
  assert_eq!(fs::metadata(&second.archive).unwrap().modified().unwrap(), modified_before);
  assert_eq!(second.digest, first.digest);
}

#[test]
fn changed_injected_content_invalidates_every_stage() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let cfg = ws.write("init.cfg", "one");
  let injected = [InjectedFile::new(&cfg, "init.d/a.cfg")];

  let first = ws.build(&injected, PipelineOptions::default()).unwrap();
  fs::write(&cfg, "two").unwrap();
  let second = ws.build(&injected, PipelineOptions::default()).unwrap();

  assert_eq!(second.executed(), 3);
  assert_ne!(second.digest, first.digest);
  assert_eq!(
    fs::read_to_string(ws.out().join("src/root/init.d/a.cfg")).unwrap(),
    "two"
  );
}

#[test]
fn moved_destination_invalidates_every_stage() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let cfg = ws.write("init.cfg", "same bytes");

  ws.build(&[InjectedFile::new(&cfg, "init.d/a.cfg")], PipelineOptions::default())
    .unwrap();
  let second = ws
    .build(&[InjectedFile::new(&cfg, "init.d/b.cfg")], PipelineOptions::default())
    .unwrap();

  assert_eq!(second.executed(), 3);
  assert_eq!(entry_names(&second.archive), vec!["root/bin/tool", "root/init.d/b.cfg"]);
}

#[test]
fn new_upstream_version_invalidates_every_stage() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let first = ws.build(&[], PipelineOptions::default()).unwrap();

  ws.publish("1.3", &[("root/bin/tool", b"newer tool")]);
  let second = ws.build(&[], PipelineOptions::default()).unwrap();

  assert_eq!(second.version, "1.3");
  assert_eq!(second.executed(), 3);
  assert_eq!(second.archive, ws.out().join("dist-gradle-1.3-bin.zip"));
  assert!(first.archive.exists());
}

#[test]
fn deleted_archive_rebuilds_identically_and_keeps_checksum() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let first = ws.build(&[], PipelineOptions::default()).unwrap();
  let bytes = fs::read(&first.archive).unwrap();
  fs::remove_file(&first.archive).unwrap();

  let second = ws.build(&[], PipelineOptions::default()).unwrap();

  assert_eq!(second.status_of(COMPOSE_STAGE), Some(StageStatus::UpToDate));
  assert_eq!(second.status_of(ARCHIVE_STAGE), Some(StageStatus::Executed));
  // Same archive bytes, so the checksum's input fingerprint is unchanged.
  assert_eq!(second.status_of(CHECKSUM_STAGE), Some(StageStatus::UpToDate));
  assert_eq!(fs::read(&second.archive).unwrap(), bytes);
  assert_eq!(fs::read_to_string(&second.checksum).unwrap(), hash_bytes(&bytes).as_str());
}

#[test]
fn rerun_executes_every_stage_and_reproduces_bytes() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  let first = ws.build(&[], PipelineOptions::default()).unwrap();
  let bytes = fs::read(&first.archive).unwrap();

  let second = ws.build(&[], PipelineOptions { rerun: true }).unwrap();

  assert_eq!(second.executed(), 3);
  assert_eq!(fs::read(&second.archive).unwrap(), bytes);
}

#[test]
fn separate_output_directories_produce_identical_archives() {
  let a = Workspace::new();
  let b = Workspace::new();
  for ws in [&a, &b] {
    ws.publish("1.2", &[TOOL, ("root/lib/a.jar", b"jar")]);
  }

  let first = a.build(&[], PipelineOptions::default()).unwrap();
  let second = b.build(&[], PipelineOptions::default()).unwrap();

  assert_eq!(fs::read(&first.archive).unwrap(), fs::read(&second.archive).unwrap());
  assert_eq!(first.digest, second.digest);
}

#[test]
fn two_top_level_directories_is_layout_error_without_outputs() {
  let ws = Workspace::new();
  ws.publish("1.2", &[("one/a", b"a"), ("two/b", b"b")]);

  let err = ws.build(&[], PipelineOptions::default()).unwrap_err();

  assert!(matches!(
    err,
    PipelineError::Stage {
      source: StageError::Compose(ComposeError::Layout { found: 2 }),
      ..
    }
  ));
  assert_eq!(err.stage(), &StageId::new(COMPOSE_STAGE));
  let leftovers = fs::read_dir(ws.out()).map(|d| d.count()).unwrap_or(0);
  assert_eq!(leftovers, 0);
}

#[test]
fn failed_run_keeps_previous_records() {
  let ws = Workspace::new();
  ws.publish("1.2", &[TOOL]);
  ws.build(&[], PipelineOptions::default()).unwrap();
  let fingerprints = ws.pipeline().layout().fingerprints_path();
  let recorded = FileStore::open(&fingerprints).lookup(&StageId::new(COMPOSE_STAGE));

  ws.publish("1.3", &[("one/a", b"a"), ("two/b", b"b")]);
  ws.build(&[], PipelineOptions::default()).unwrap_err();

  let store = FileStore::open(&fingerprints);
  assert_eq!(store.lookup(&StageId::new(COMPOSE_STAGE)), recorded);
  assert!(!ws.out().join("src").exists());
}
