//! Archive checksum sibling file.
//!
//! `<archive>.sha256` holds the lowercase hex SHA-256 digest of the archive's
//! bytes and nothing else (no file name, no trailing newline).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

use crate::consts::CHECKSUM_EXTENSION;
use crate::util::hash::{ContentHash, HashError, hash_file};

#[derive(Debug, Error)]
pub enum ChecksumError {
  #[error("failed to hash archive: {0}")]
  Hash(#[from] HashError),

  #[error("failed to write checksum file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read checksum file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("archive {archive} has no file name")]
  InvalidArchivePath { archive: PathBuf },
}

/// Outcome of comparing an archive with its checksum file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
  pub expected: String,
  pub actual: ContentHash,
}

impl Verification {
  pub fn is_match(&self) -> bool {
    self.expected == self.actual.as_str()
  }
}

/// Path of the checksum file that sits next to `archive`.
pub fn checksum_path(archive: &Path) -> Result<PathBuf, ChecksumError> {
  let name = archive.file_name().ok_or_else(|| ChecksumError::InvalidArchivePath {
    archive: archive.to_path_buf(),
  })?;
  let mut name = name.to_os_string();
  name.push(".");
  name.push(CHECKSUM_EXTENSION);
  Ok(archive.with_file_name(name))
}

/// Hash `archive` and write the digest to its sibling checksum file.
pub fn write_checksum(archive: &Path) -> Result<(PathBuf, ContentHash), ChecksumError> {
  let digest = hash_file(archive)?;
  let path = checksum_path(archive)?;

  let write_err = |source| ChecksumError::Write {
    path: path.clone(),
    source,
  };
  let dir = path.parent().unwrap_or(Path::new("."));
  let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
  temp.write_all(digest.as_str().as_bytes()).map_err(write_err)?;
  temp.persist(&path).map_err(|e| write_err(e.error))?;

  info!(archive = ?archive, digest = %digest, "wrote checksum");
  Ok((path, digest))
}

/// Read the digest recorded next to `archive`.
pub fn read_checksum(archive: &Path) -> Result<String, ChecksumError> {
  let path = checksum_path(archive)?;
  let recorded = fs::read_to_string(&path).map_err(|source| ChecksumError::Read { path, source })?;
  Ok(recorded.trim().to_lowercase())
}

/// Recompute the digest of `archive` and compare it with the recorded one.
pub fn verify_checksum(archive: &Path) -> Result<Verification, ChecksumError> {
  let expected = read_checksum(archive)?;
  let actual = hash_file(archive)?;
  Ok(Verification { expected, actual })
}
