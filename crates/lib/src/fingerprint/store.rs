//! Fingerprint record storage.
//!
//! Records the input fingerprint of each stage's last successful execution.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "stages": {
//!     "archive": "3f2a...",
//!     "checksum": "9b1c...",
//!     "compose": "d04e..."
//!   }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::stage::StageId;
use crate::util::hash::ContentHash;

/// Current fingerprint file format version.
pub const FINGERPRINTS_VERSION: u32 = 1;

/// Errors persisting fingerprint records.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to create state directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write fingerprint records to {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize fingerprint records: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Lookup/record interface over persisted stage fingerprints.
pub trait FingerprintStore {
  /// Fingerprint recorded by the stage's last successful execution.
  fn lookup(&self, stage: &StageId) -> Option<ContentHash>;

  /// Record the fingerprint of a successful execution, replacing any previous record.
  fn record(&mut self, stage: &StageId, fingerprint: &ContentHash) -> Result<(), StoreError>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  records: HashMap<StageId, ContentHash>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

impl FingerprintStore for MemoryStore {
  fn lookup(&self, stage: &StageId) -> Option<ContentHash> {
    self.records.get(stage).cloned()
  }

  fn record(&mut self, stage: &StageId, fingerprint: &ContentHash) -> Result<(), StoreError> {
    self.records.insert(stage.clone(), fingerprint.clone());
    Ok(())
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct FingerprintFile {
  version: u32,
  stages: BTreeMap<String, ContentHash>,
}

/// JSON file-backed store.
///
/// An unreadable, corrupt, or incompatible file is treated as empty: every stage
/// misses the cache and re-executes, which rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
  path: PathBuf,
  records: BTreeMap<String, ContentHash>,
}

impl FileStore {
  /// Open the store at `path`, loading existing records if present.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let records = Self::load(&path);
    Self { path, records }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn load(path: &Path) -> BTreeMap<String, ContentHash> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
      Err(e) => {
        warn!(path = ?path, error = %e, "failed to read fingerprint records, starting empty");
        return BTreeMap::new();
      }
    };

    match serde_json::from_str::<FingerprintFile>(&content) {
      Ok(file) if file.version == FINGERPRINTS_VERSION => {
        debug!(path = ?path, count = file.stages.len(), "loaded fingerprint records");
        file.stages
      }
      Ok(file) => {
        warn!(path = ?path, version = file.version, "unsupported fingerprint file version, starting empty");
        BTreeMap::new()
      }
      Err(e) => {
        warn!(path = ?path, error = %e, "corrupt fingerprint records, starting empty");
        BTreeMap::new()
      }
    }
  }

  /// Write all records atomically (write to temp, then rename).
  fn save(&self) -> Result<(), StoreError> {
    let dir = self.path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
      path: dir.to_path_buf(),
      source,
    })?;

    let file = FingerprintFile {
      version: FINGERPRINTS_VERSION,
      stages: self.records.clone(),
    };
    let content = serde_json::to_string_pretty(&file).map_err(StoreError::Serialize)?;

    let write_err = |source| StoreError::Write {
      path: self.path.clone(),
      source,
    };
    let temp_path = self.path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(write_err)?;
    fs::rename(&temp_path, &self.path).map_err(write_err)?;

    Ok(())
  }
}

impl FingerprintStore for FileStore {
  fn lookup(&self, stage: &StageId) -> Option<ContentHash> {
    self.records.get(stage.as_str()).cloned()
  }

  fn record(&mut self, stage: &StageId, fingerprint: &ContentHash) -> Result<(), StoreError> {
    self.records.insert(stage.as_str().to_string(), fingerprint.clone());
    self.save()
  }
}
