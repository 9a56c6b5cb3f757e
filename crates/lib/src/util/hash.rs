//! Hashing utilities for content-addressed change detection.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash
//! - `hash_file()`: Single file hashing
//! - `hash_bytes()`: Arbitrary byte hashing
//! - `hash_tree()`: Deterministic hash of a directory's regular files

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::util::tree::regular_files;

/// A full 64-character SHA-256 hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
  pub(crate) fn from_hasher(hasher: Sha256) -> Self {
    ContentHash(hex::encode(hasher.finalize()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing on-disk content.
#[derive(Debug, Error)]
pub enum HashError {
  #[error("failed to read file {path}: {source}")]
  ReadFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to walk directory {path}: {source}")]
  WalkDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA-256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let read_err = |source| HashError::ReadFile {
    path: path.to_path_buf(),
    source,
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(read_err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash::from_hasher(hasher))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash::from_hasher(hasher)
}

/// Compute a deterministic hash of a directory tree.
///
/// The hash covers the sorted list of `(relative path, content hash)` pairs of
/// every regular file under `root`. Timestamps, permissions, empty directories
/// and symlinks do not contribute.
pub fn hash_tree(root: &Path) -> Result<ContentHash, HashError> {
  let entries = regular_files(root).map_err(|source| HashError::WalkDir {
    path: root.to_path_buf(),
    source,
  })?;

  let mut hasher = Sha256::new();
  for entry in entries {
    let content_hash = hash_file(&entry.path)?;
    hasher.update(format!("F:{}:{}", entry.rel_path, content_hash.0).as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash::from_hasher(hasher))
}
