//! Incremental stage gate.
//!
//! A stage declares its inputs and outputs. The gate fingerprints the inputs and
//! compares the result to the fingerprint recorded by the stage's last successful
//! run:
//!
//! - **Up to date**: fingerprints match and every declared output exists. Nothing
//!   runs and nothing is recorded.
//! - **Out of date**: stale outputs are deleted, the work runs, and on success the
//!   new fingerprint is recorded. On failure partial outputs are deleted and the
//!   previous record is left as it was.

mod types;

pub use types::*;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::fingerprint::{FingerprintInput, FingerprintStore, fingerprint};
use crate::util::hash::ContentHash;

/// A unit of work with declared inputs and outputs.
pub trait Stage {
  /// Value handed to the next stage.
  type Output;

  fn id(&self) -> StageId;

  /// Inputs in canonical order.
  fn inputs(&self) -> Vec<FingerprintInput>;

  /// Paths the stage produces. Existence is checked, not content.
  fn outputs(&self) -> Vec<PathBuf>;

  /// Produce the outputs.
  fn execute(&self) -> Result<(), StageError>;

  /// Describe the outputs as they exist on disk, after execution or a cache hit.
  fn output(&self) -> Result<Self::Output, StageError>;
}

/// Gate deciding whether a stage's work runs.
pub struct IncrementalStage<'a, S: FingerprintStore + ?Sized> {
  store: &'a mut S,
  rerun: bool,
}

impl<'a, S: FingerprintStore + ?Sized> IncrementalStage<'a, S> {
  pub fn new(store: &'a mut S) -> Self {
    Self { store, rerun: false }
  }

  /// Ignore recorded fingerprints and always execute.
  pub fn with_rerun(mut self, rerun: bool) -> Self {
    self.rerun = rerun;
    self
  }

  /// Run `work` unless `inputs` are unchanged and `outputs` exist.
  pub fn run<F>(
    &mut self,
    id: &StageId,
    inputs: &[FingerprintInput],
    outputs: &[PathBuf],
    work: F,
  ) -> Result<(StageStatus, ContentHash), StageError>
  where
    F: FnOnce() -> Result<(), StageError>,
  {
    let current = fingerprint(inputs)?;
    let previous = self.store.lookup(id);

    if !self.rerun && previous.as_ref() == Some(&current) && outputs.iter().all(|p| p.exists()) {
      debug!(stage = %id, fingerprint = %current, "stage up to date (cache hit)");
      return Ok((StageStatus::UpToDate, current));
    }

    info!(
      stage = %id,
      fingerprint = %current,
      previous = previous.as_ref().map(|p| p.as_str()).unwrap_or("none"),
      "executing stage"
    );

    for path in outputs {
      remove_output(path)?;
    }

    if let Err(e) = work() {
      for path in outputs {
        if let Err(cleanup) = remove_output(path) {
          warn!(stage = %id, error = %cleanup, "failed to remove partial output");
        }
      }
      return Err(e);
    }

    if let Some(missing) = outputs.iter().find(|p| !p.exists()) {
      return Err(StageError::MissingOutput { path: missing.clone() });
    }

    self.store.record(id, &current)?;
    info!(stage = %id, "stage complete");

    Ok((StageStatus::Executed, current))
  }

  /// Run a [`Stage`] through the gate and describe its outputs.
  pub fn run_stage<T: Stage>(&mut self, stage: &T) -> Result<StageRun<T::Output>, StageError> {
    let (status, fingerprint) = self.run(&stage.id(), &stage.inputs(), &stage.outputs(), || stage.execute())?;
    Ok(StageRun {
      output: stage.output()?,
      status,
      fingerprint,
    })
  }
}

/// Delete a file or directory, ignoring paths that do not exist.
fn remove_output(path: &Path) -> Result<(), StageError> {
  let result = match fs::symlink_metadata(path) {
    Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
    Ok(_) => fs::remove_file(path),
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
    Err(e) => Err(e),
  };

  result.map_err(|source| StageError::RemoveOutput {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = ?path, "removed stale output");
  Ok(())
}
