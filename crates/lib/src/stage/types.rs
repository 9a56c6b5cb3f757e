use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::checksum::ChecksumError;
use crate::compose::ComposeError;
use crate::fingerprint::{FingerprintError, StoreError};
use crate::util::hash::ContentHash;

/// Identifies a stage in the fingerprint store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for StageId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What a gated run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
  /// The work ran and its fingerprint was recorded.
  Executed,
  /// Inputs matched the recorded fingerprint and outputs existed; nothing ran.
  UpToDate,
}

impl StageStatus {
  pub fn is_executed(self) -> bool {
    matches!(self, StageStatus::Executed)
  }
}

impl std::fmt::Display for StageStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      StageStatus::Executed => write!(f, "executed"),
      StageStatus::UpToDate => write!(f, "up-to-date"),
    }
  }
}

/// Result of running a [`Stage`](super::Stage) through the gate.
#[derive(Debug, Clone)]
pub struct StageRun<T> {
  pub output: T,
  pub status: StageStatus,
  pub fingerprint: ContentHash,
}

/// Errors raised while gating or executing a stage.
#[derive(Debug, Error)]
pub enum StageError {
  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("failed to remove stale output {path}: {source}")]
  RemoveOutput {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("stage completed without producing declared output {path}")]
  MissingOutput { path: PathBuf },

  #[error("output {path} collides with a path the pipeline manages")]
  ReservedOutput { path: PathBuf },

  #[error(transparent)]
  Compose(#[from] ComposeError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Checksum(#[from] ChecksumError),
}
