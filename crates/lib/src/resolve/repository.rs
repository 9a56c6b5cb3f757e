//! Artifact repositories.
//!
//! A repository lays out one file per published version, named by an artifact
//! pattern. The default pattern matches the upstream distribution server:
//!
//! ```text
//! [organization]-[revision]-[artifact].[ext]   ->   gradle-8.5-bin.zip
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Coordinate, ResolveError};

/// Default artifact file name pattern.
pub const DEFAULT_PATTERN: &str = "[organization]-[revision]-[artifact].[ext]";

const REVISION_TOKEN: &str = "[revision]";

/// Source of candidate versions and their archives.
pub trait Repository {
  /// Human-readable location, for logs and errors.
  fn location(&self) -> String;

  /// All published versions of `coordinate`, in no particular order.
  fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, ResolveError>;

  /// Make the archive of `version` available locally and return its path.
  fn fetch(&self, coordinate: &Coordinate, version: &str) -> Result<PathBuf, ResolveError>;
}

/// File name pattern with `[organization]`, `[artifact]`, `[revision]` and `[ext]` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern(String);

impl ArtifactPattern {
  pub fn new(pattern: impl Into<String>) -> Result<Self, ResolveError> {
    let pattern = pattern.into();
    let count = pattern.matches(REVISION_TOKEN).count();
    if count != 1 {
      return Err(ResolveError::InvalidPattern {
        pattern,
        reason: format!("expected exactly one {REVISION_TOKEN} token, found {count}"),
      });
    }
    if pattern.contains('/') {
      return Err(ResolveError::InvalidPattern {
        pattern,
        reason: "pattern must name a file, not a path".to_string(),
      });
    }
    Ok(Self(pattern))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// File name of `version` of `coordinate`.
  pub fn file_name(&self, coordinate: &Coordinate, version: &str) -> String {
    self.substitute(coordinate).replace(REVISION_TOKEN, version)
  }

  /// Extract the version from `file_name`, if it names an artifact of `coordinate`.
  pub fn match_version(&self, coordinate: &Coordinate, file_name: &str) -> Option<String> {
    let template = self.substitute(coordinate);
    let (prefix, suffix) = template.split_once(REVISION_TOKEN)?;
    let version = file_name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if version.is_empty() {
      return None;
    }
    Some(version.to_string())
  }

  fn substitute(&self, coordinate: &Coordinate) -> String {
    self
      .0
      .replace("[organization]", &coordinate.organization)
      .replace("[artifact]", &coordinate.artifact)
      .replace("[ext]", &coordinate.extension)
  }
}

impl Default for ArtifactPattern {
  fn default() -> Self {
    Self(DEFAULT_PATTERN.to_string())
  }
}

/// Collect the versions named by `file_names`, deduplicated.
pub(super) fn versions_from_names<'a>(
  pattern: &ArtifactPattern,
  coordinate: &Coordinate,
  file_names: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
  file_names
    .into_iter()
    .filter_map(|name| pattern.match_version(coordinate, name))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// A local directory mirroring the distribution server.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
  root: PathBuf,
  pattern: ArtifactPattern,
}

impl DirectoryRepository {
  pub fn new(root: impl Into<PathBuf>, pattern: ArtifactPattern) -> Self {
    Self {
      root: root.into(),
      pattern,
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl Repository for DirectoryRepository {
  fn location(&self) -> String {
    self.root.display().to_string()
  }

  fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, ResolveError> {
    let list_err = |source| ResolveError::List {
      location: self.location(),
      source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(&self.root).map_err(list_err)? {
      let entry = entry.map_err(list_err)?;
      if entry.file_type().map_err(list_err)?.is_file() {
        names.push(entry.file_name().to_string_lossy().to_string());
      }
    }

    let versions = versions_from_names(&self.pattern, coordinate, names.iter().map(String::as_str));
    debug!(repository = %self.location(), count = versions.len(), "listed versions");
    Ok(versions)
  }

  fn fetch(&self, coordinate: &Coordinate, version: &str) -> Result<PathBuf, ResolveError> {
    let path = self.root.join(self.pattern.file_name(coordinate, version));
    if !path.is_file() {
      return Err(ResolveError::ArtifactNotFound {
        coordinate: coordinate.to_string(),
        version: version.to_string(),
        location: path.display().to_string(),
      });
    }
    Ok(path)
  }
}
