//! Distribution composition.
//!
//! Unpacks the upstream distribution archive and merges injected files into its
//! single top-level directory:
//!
//! ```text
//! <output>/src/            # composed root
//! └── gradle-8.5/          # the one top-level directory of the upstream archive
//!     ├── bin/...
//!     └── init.d/          # injected files land relative to this directory
//! ```
//!
//! An archive with zero or several top-level entries, or whose only entry is a
//! file, is a layout error.

pub mod extract;

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use extract::unpack_archive;

/// Errors that can occur while composing a distribution.
#[derive(Debug, Error)]
pub enum ComposeError {
  /// The extracted archive does not contain exactly one top-level entry.
  #[error("extracted archive must contain exactly one top-level directory, found {found} entries")]
  Layout { found: usize },

  /// The single top-level entry is not a directory.
  #[error("extracted archive's top-level entry '{name}' is not a directory")]
  LayoutNotDirectory { name: String },

  #[error("unsupported archive format: {path}")]
  UnsupportedArchive { path: PathBuf },

  #[error("archive {archive} contains unsafe entry '{name}'")]
  UnsafeEntry { archive: PathBuf, name: String },

  #[error("injected file destination must be a relative path without '..': {destination}")]
  InvalidDestination { destination: PathBuf },

  #[error("failed to read zip archive {path}: {source}")]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A file merged into the composed distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFile {
  /// File on disk whose bytes are copied.
  pub source: PathBuf,
  /// Destination relative to the distribution's top-level directory.
  pub destination: PathBuf,
}

impl InjectedFile {
  pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
    Self {
      source: source.into(),
      destination: destination.into(),
    }
  }

  /// Check that the destination stays inside the top-level directory.
  pub fn validate(&self) -> Result<(), ComposeError> {
    let mut components = self.destination.components().peekable();
    let valid = components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)));
    if valid {
      Ok(())
    } else {
      Err(ComposeError::InvalidDestination {
        destination: self.destination.clone(),
      })
    }
  }
}

/// A composed distribution on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDistribution {
  /// Directory whose only child is `top_level`. The archive is built from here.
  pub root: PathBuf,
  /// The distribution's top-level directory.
  pub top_level: PathBuf,
}

impl ComposedDistribution {
  /// Describe an existing composed root, re-checking its layout.
  pub fn open(root: &Path) -> Result<Self, ComposeError> {
    let top_level = single_top_level(root)?;
    Ok(Self {
      root: root.to_path_buf(),
      top_level,
    })
  }
}

/// Compose a distribution into `dest`.
///
/// Extraction happens in a scratch directory next to `dest`; `dest` only appears
/// once the layout check passed and every injected file was copied. Any existing
/// `dest` is replaced.
pub fn compose(archive: &Path, injected: &[InjectedFile], dest: &Path) -> Result<ComposedDistribution, ComposeError> {
  for file in injected {
    file.validate()?;
  }

  let parent = dest.parent().unwrap_or(Path::new("."));
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| ComposeError::Io { path, source }
  };

  fs::create_dir_all(parent).map_err(io_err(parent))?;
  let scratch = tempfile::Builder::new()
    .prefix(".compose-")
    .tempdir_in(parent)
    .map_err(io_err(parent))?;

  unpack_archive(archive, scratch.path())?;
  let top_level = single_top_level(scratch.path())?;
  debug!(top_level = ?top_level, "found distribution top-level directory");

  for file in injected {
    let target = top_level.join(&file.destination);
    if let Some(dir) = target.parent() {
      fs::create_dir_all(dir).map_err(io_err(dir))?;
    }
    fs::copy(&file.source, &target).map_err(io_err(&file.source))?;
    debug!(source = ?file.source, destination = ?file.destination, "injected file");
  }

  if dest.exists() {
    fs::remove_dir_all(dest).map_err(io_err(dest))?;
  }
  // The scratch guard's cleanup is a no-op once its directory has been renamed away.
  fs::rename(scratch.path(), dest).map_err(io_err(dest))?;

  info!(dest = ?dest, injected = injected.len(), "composed distribution");
  ComposedDistribution::open(dest)
}

/// Return the one top-level directory under `root`.
fn single_top_level(root: &Path) -> Result<PathBuf, ComposeError> {
  let entries = fs::read_dir(root)
    .and_then(|entries| entries.collect::<Result<Vec<_>, _>>())
    .map_err(|source| ComposeError::Io {
      path: root.to_path_buf(),
      source,
    })?;

  if entries.len() != 1 {
    return Err(ComposeError::Layout { found: entries.len() });
  }

  let entry = &entries[0];
  let path = entry.path();
  if !path.is_dir() {
    return Err(ComposeError::LayoutNotDirectory {
      name: entry.file_name().to_string_lossy().to_string(),
    });
  }

  Ok(path)
}
