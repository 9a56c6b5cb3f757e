//! Deterministic archive builder.
//!
//! Packs the regular files of a composed tree into a zip archive whose bytes
//! depend only on each file's relative path and content:
//!
//! - entries are written in lexicographic order of their `/`-separated path
//! - every entry carries the same timestamp and permission bits
//! - directories are implied by file paths; no directory entries are written
//!
//! The archive is written to a temporary file next to the destination and
//! renamed into place, so a failed build never leaves a truncated archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::util::tree::regular_files;

/// Permission bits stored for every archive entry.
pub const ENTRY_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("failed to read tree {path}: {source}")]
  ReadTree {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write archive {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to encode archive {path}: {source}")]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },
}

/// Build a deterministic archive of `root` at `dest`.
///
/// Returns the entry names in the order they were written.
pub fn build_archive(root: &Path, dest: &Path) -> Result<Vec<String>, ArchiveError> {
  let entries = regular_files(root).map_err(|source| ArchiveError::ReadTree {
    path: root.to_path_buf(),
    source,
  })?;

  let write_err = |source| ArchiveError::Write {
    path: dest.to_path_buf(),
    source,
  };
  let zip_err = |source| ArchiveError::Zip {
    path: dest.to_path_buf(),
    source,
  };

  let dir = dest.parent().unwrap_or(Path::new("."));
  fs::create_dir_all(dir).map_err(write_err)?;
  let temp = NamedTempFile::new_in(dir).map_err(write_err)?;

  let options = entry_options();
  let mut zip = ZipWriter::new(BufWriter::new(temp.reopen().map_err(write_err)?));

  for entry in &entries {
    zip.start_file(entry.rel_path.as_str(), options).map_err(zip_err)?;
    let mut source = File::open(&entry.path).map_err(|source| ArchiveError::ReadTree {
      path: entry.path.clone(),
      source,
    })?;
    io::copy(&mut source, &mut zip).map_err(write_err)?;
    debug!(entry = %entry.rel_path, "archived");
  }

  let mut writer = zip.finish().map_err(zip_err)?;
  writer.flush().map_err(write_err)?;
  drop(writer);

  temp.persist(dest).map_err(|e| write_err(e.error))?;
  info!(archive = ?dest, entries = entries.len(), "built archive");

  Ok(entries.into_iter().map(|e| e.rel_path).collect())
}

/// Fixed per-entry metadata.
///
/// `DateTime::default()` is the zip epoch (1980-01-01 00:00:00).
fn entry_options() -> SimpleFileOptions {
  SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .unix_permissions(ENTRY_MODE)
}

/// List entry names of an existing archive in stored order.
pub fn list_entries(archive: &Path) -> Result<Vec<String>, ArchiveError> {
  let file = File::open(archive).map_err(|source| ArchiveError::ReadTree {
    path: archive.to_path_buf(),
    source,
  })?;
  let zip_err = |source| ArchiveError::Zip {
    path: archive.to_path_buf(),
    source,
  };
  let mut zip = zip::ZipArchive::new(io::BufReader::new(file)).map_err(zip_err)?;

  (0..zip.len())
    .map(|i| zip.by_index(i).map(|entry| entry.name().to_string()).map_err(zip_err))
    .collect()
}
