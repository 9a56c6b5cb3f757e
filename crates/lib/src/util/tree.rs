//! Regular-file walk over a directory tree.
//!
//! Both the tree fingerprint and the archive builder see a tree through this walk,
//! so the set of paths that invalidates the archive stage is exactly the set of
//! paths that ends up in the archive.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// A regular file found under a tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
  /// Path relative to the tree root, `/`-separated.
  pub rel_path: String,
  /// Absolute path on disk.
  pub path: PathBuf,
}

/// Collect all regular files under `root`, sorted lexicographically by relative path.
///
/// Directories are implied by file paths and are not returned. Symlinks and special
/// files are skipped.
pub fn regular_files(root: &Path) -> io::Result<Vec<TreeEntry>> {
  let mut entries = Vec::new();

  for entry in WalkDir::new(root).follow_links(false) {
    let entry = entry?;
    let file_type = entry.file_type();

    if file_type.is_dir() {
      continue;
    }
    if !file_type.is_file() {
      debug!(path = ?entry.path(), "skipping non-regular file");
      continue;
    }

    let rel = entry.path().strip_prefix(root).map_err(io::Error::other)?;
    entries.push(TreeEntry {
      rel_path: to_archive_path(rel),
      path: entry.path().to_path_buf(),
    });
  }

  // Sort on the normalized string, not on OS paths, so the order is platform independent.
  entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
  Ok(entries)
}

/// Render a relative path with `/` separators.
pub fn to_archive_path(rel: &Path) -> String {
  rel
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
