//! Build command implementation.
//!
//! Resolves the distribution version and runs the compose, archive and
//! checksum stages under the output directory's build lock.

use std::path::Path;

use anyhow::{Context, Result};

use distpack_lib::config::Config;
use distpack_lib::fingerprint::FileStore;
use distpack_lib::lock::BuildLock;
use distpack_lib::pipeline::{Pipeline, PipelineOptions};
use distpack_lib::resolve::resolve;

use crate::output::{OutputFormat, print_json, print_stage, print_stat, print_success};

pub fn cmd_build(config_path: &Path, rerun: bool, output: OutputFormat) -> Result<()> {
  let config = Config::load(config_path).context("Failed to load configuration")?;
  let layout = config.layout();
  let _lock = BuildLock::acquire(&layout.state_dir(), "build").context("Failed to acquire build lock")?;

  let repository = config.open_repository()?;
  let artifact = resolve(&config.spec, repository.as_ref()).context("Failed to resolve distribution")?;

  let pipeline = Pipeline::new(layout.clone(), config.archive_name.clone()).with_options(PipelineOptions { rerun });
  let mut store = FileStore::open(layout.fingerprints_path());
  let report = pipeline.run(&mut store, &artifact, &config.injected)?;

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  for stage in &report.stages {
    print_stage(stage);
  }
  println!();
  if report.executed() == 0 {
    print_success("Distribution up to date");
  } else {
    print_success("Distribution built");
  }
  print_stat("Version", &report.version);
  print_stat("Archive", &report.archive.display().to_string());
  print_stat("Checksum", &report.checksum.display().to_string());
  print_stat("SHA-256", report.digest.as_str());

  Ok(())
}
