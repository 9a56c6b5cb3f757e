//! Archive extraction.
//!
//! Supports:
//! - `.zip`
//! - `.tar.gz` / `.tgz`
//! - `.tar`
//!
//! Entries are unpacked as-is: no leading component is stripped, since the
//! composer needs to see the distribution's top-level directory.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info};

use super::ComposeError;

/// Unpack `archive` into `dest`, creating `dest` if needed.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<(), ComposeError> {
  let name = archive
    .file_name()
    .map(|n| n.to_string_lossy().to_lowercase())
    .unwrap_or_default();

  fs::create_dir_all(dest).map_err(|source| ComposeError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  if name.ends_with(".zip") {
    unpack_zip(archive, dest)?;
  } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
    let file = open(archive)?;
    unpack_tar(archive, GzDecoder::new(BufReader::new(file)), dest)?;
  } else if name.ends_with(".tar") {
    let file = open(archive)?;
    unpack_tar(archive, BufReader::new(file), dest)?;
  } else {
    return Err(ComposeError::UnsupportedArchive {
      path: archive.to_path_buf(),
    });
  }

  info!(archive = ?archive, dest = ?dest, "unpacked archive");
  Ok(())
}

fn open(archive: &Path) -> Result<File, ComposeError> {
  File::open(archive).map_err(|source| ComposeError::Io {
    path: archive.to_path_buf(),
    source,
  })
}

fn unpack_tar<R: io::Read>(archive: &Path, reader: R, dest: &Path) -> Result<(), ComposeError> {
  // `unpack` refuses entries that would escape `dest`.
  Archive::new(reader).unpack(dest).map_err(|source| ComposeError::Io {
    path: archive.to_path_buf(),
    source,
  })
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<(), ComposeError> {
  let zip_err = |source| ComposeError::Zip {
    path: archive.to_path_buf(),
    source,
  };

  let file = open(archive)?;
  let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(zip_err)?;

  for i in 0..zip.len() {
    let mut entry = zip.by_index(i).map_err(zip_err)?;

    let rel = entry.enclosed_name().ok_or_else(|| ComposeError::UnsafeEntry {
      archive: archive.to_path_buf(),
      name: entry.name().to_string(),
    })?;
    let out_path = dest.join(&rel);

    let io_err = |source| ComposeError::Io {
      path: out_path.clone(),
      source,
    };

    if entry.is_dir() {
      fs::create_dir_all(&out_path).map_err(io_err)?;
      continue;
    }

    if let Some(parent) = out_path.parent() {
      fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut out = File::create(&out_path).map_err(io_err)?;
    io::copy(&mut entry, &mut out).map_err(io_err)?;
    debug!(entry = %rel.display(), "extracted");
  }

  Ok(())
}
