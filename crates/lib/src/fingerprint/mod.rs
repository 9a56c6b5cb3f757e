//! Content fingerprints over named inputs.
//!
//! A fingerprint is a SHA-256 digest over an ordered sequence of named inputs.
//! Each input contributes its name and the content hash of its source, so two
//! input sets fingerprint equal only if every name and every byte matches.
//!
//! The order of inputs is significant: callers supply a canonical order.
//!
//! # Submodules
//!
//! - [`store`] - Persisted `(stage, fingerprint)` records

pub mod store;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::util::hash::{ContentHash, HashError, hash_bytes, hash_file, hash_tree};

pub use store::{FileStore, FingerprintStore, MemoryStore, StoreError};

/// Where an input's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
  /// Contents of a single file.
  File(PathBuf),
  /// Regular files under a directory, with their relative paths.
  Tree(PathBuf),
  /// An in-memory buffer.
  Bytes(Vec<u8>),
  /// A scalar value such as a version string or a destination path.
  Value(String),
}

impl InputSource {
  fn tag(&self) -> u8 {
    match self {
      InputSource::File(_) => b'F',
      InputSource::Tree(_) => b'T',
      InputSource::Bytes(_) => b'B',
      InputSource::Value(_) => b'V',
    }
  }

  fn content_hash(&self) -> Result<ContentHash, HashError> {
    match self {
      InputSource::File(path) => hash_file(path),
      InputSource::Tree(path) => hash_tree(path),
      InputSource::Bytes(bytes) => Ok(hash_bytes(bytes)),
      InputSource::Value(value) => Ok(hash_bytes(value.as_bytes())),
    }
  }
}

/// A named input to a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInput {
  pub name: String,
  pub source: InputSource,
}

impl FingerprintInput {
  pub fn file(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
    Self {
      name: name.into(),
      source: InputSource::File(path.as_ref().to_path_buf()),
    }
  }

  pub fn tree(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
    Self {
      name: name.into(),
      source: InputSource::Tree(path.as_ref().to_path_buf()),
    }
  }

  pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self {
      name: name.into(),
      source: InputSource::Bytes(bytes.into()),
    }
  }

  pub fn value(name: impl Into<String>, value: impl std::fmt::Display) -> Self {
    Self {
      name: name.into(),
      source: InputSource::Value(value.to_string()),
    }
  }
}

/// Error computing a fingerprint.
#[derive(Debug, Error)]
#[error("failed to fingerprint input '{name}': {source}")]
pub struct FingerprintError {
  pub name: String,
  #[source]
  pub source: HashError,
}

/// Compute the fingerprint of an ordered sequence of inputs.
///
/// Pure function of the inputs' names, kinds and bytes. Inputs are not
/// re-ordered.
pub fn fingerprint(inputs: &[FingerprintInput]) -> Result<ContentHash, FingerprintError> {
  let mut hasher = Sha256::new();

  for input in inputs {
    let content = input.source.content_hash().map_err(|source| FingerprintError {
      name: input.name.clone(),
      source,
    })?;

    // Length-prefixed name keeps ("ab", "c") distinct from ("a", "bc").
    hasher.update((input.name.len() as u64).to_le_bytes());
    hasher.update(input.name.as_bytes());
    hasher.update([input.source.tag()]);
    hasher.update(content.0.as_bytes());
  }

  Ok(ContentHash::from_hasher(hasher))
}
