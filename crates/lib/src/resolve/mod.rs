//! Version resolution.
//!
//! Selects the distribution version to repackage and makes its archive
//! available locally:
//!
//! 1. List candidate versions from a [`Repository`]
//! 2. Drop candidates the coordinate's selector does not admit
//! 3. Drop candidates the rejection rule rejects (e.g. any version containing `-`)
//! 4. Pick the highest remaining version and fetch its archive
//!
//! No retries happen here; a failed listing or download fails resolution.

pub mod http;
pub mod repository;
mod types;
pub mod version;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

pub use http::HttpRepository;
pub use repository::{ArtifactPattern, DEFAULT_PATTERN, DirectoryRepository, Repository};
pub use types::*;
pub use version::compare_versions;

/// Errors that can occur during version resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error(transparent)]
  Coordinate(#[from] CoordinateError),

  #[error("invalid artifact pattern '{pattern}': {reason}")]
  InvalidPattern { pattern: String, reason: String },

  #[error("invalid repository url '{url}': {reason}")]
  InvalidUrl { url: String, reason: String },

  /// No candidate passed the selector and rejection rule.
  #[error("no version of {coordinate} is acceptable (candidates: [{}], rejected: [{}])", .candidates.join(", "), .rejected.join(", "))]
  NoMatchingVersion {
    coordinate: String,
    candidates: Vec<String>,
    rejected: Vec<String>,
  },

  #[error("failed to list repository {location}: {source}")]
  List {
    location: String,
    #[source]
    source: io::Error,
  },

  #[error("artifact {coordinate} version {version} not found at {location}")]
  ArtifactNotFound {
    coordinate: String,
    version: String,
    location: String,
  },

  #[error("request to {url} failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("request to {url} returned status {status}")]
  HttpStatus { url: String, status: u16 },

  #[error("failed to store download at {path}: {source}")]
  Download {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Pick the highest candidate `spec` accepts.
pub fn select_version(spec: &VersionSpec, candidates: &[String]) -> Result<String, ResolveError> {
  let mut rejected = Vec::new();
  let mut best: Option<&str> = None;

  for candidate in candidates {
    if !spec.coordinate.selector.matches(candidate) {
      continue;
    }
    if let Some(marker) = spec.rejection_reason(candidate) {
      debug!(version = %candidate, marker = %marker, "rejected candidate");
      rejected.push(candidate.clone());
      continue;
    }
    if best.is_none_or(|b| compare_versions(candidate, b).is_gt()) {
      best = Some(candidate);
    }
  }

  best.map(str::to_string).ok_or_else(|| ResolveError::NoMatchingVersion {
    coordinate: spec.coordinate.to_string(),
    candidates: candidates.to_vec(),
    rejected,
  })
}

/// Select the version `spec` resolves to in `repo` without fetching it.
pub fn resolve_version(spec: &VersionSpec, repo: &dyn Repository) -> Result<String, ResolveError> {
  let candidates = repo.list_versions(&spec.coordinate)?;
  debug!(repository = %repo.location(), candidates = candidates.len(), "listed candidates");
  select_version(spec, &candidates)
}

/// Resolve `spec` against `repo` and fetch the selected archive.
pub fn resolve(spec: &VersionSpec, repo: &dyn Repository) -> Result<ResolvedArtifact, ResolveError> {
  let version = resolve_version(spec, repo)?;
  let archive_path = repo.fetch(&spec.coordinate, &version)?;
  info!(coordinate = %spec.coordinate, version = %version, archive = ?archive_path, "resolved distribution");

  Ok(ResolvedArtifact { version, archive_path })
}
