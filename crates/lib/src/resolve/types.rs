//! Core types for version resolution.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a coordinate string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
  #[error("coordinate '{0}' must have the form 'organization:artifact:selector@ext'")]
  Format(String),

  #[error("coordinate '{coordinate}' has an empty {part}")]
  EmptyPart { coordinate: String, part: &'static str },
}

/// Which versions a coordinate admits before rejection rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
  /// `+`: any version.
  Latest,
  /// `8.+`: versions starting with the prefix.
  Prefix(String),
  /// `8.5`: exactly this version.
  Exact(String),
}

impl Selector {
  pub fn matches(&self, version: &str) -> bool {
    match self {
      Selector::Latest => true,
      Selector::Prefix(prefix) => version.starts_with(prefix.as_str()),
      Selector::Exact(exact) => version == exact,
    }
  }
}

impl fmt::Display for Selector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Selector::Latest => write!(f, "+"),
      Selector::Prefix(prefix) => write!(f, "{prefix}+"),
      Selector::Exact(exact) => write!(f, "{exact}"),
    }
  }
}

/// A dependency coordinate: `organization:artifact:selector@ext`.
///
/// ```
/// use distpack_lib::resolve::{Coordinate, Selector};
///
/// let c: Coordinate = "gradle:bin:+@zip".parse().unwrap();
/// assert_eq!(c.organization, "gradle");
/// assert_eq!(c.artifact, "bin");
/// assert_eq!(c.selector, Selector::Latest);
/// assert_eq!(c.extension, "zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
  pub organization: String,
  pub artifact: String,
  pub selector: Selector,
  pub extension: String,
}

impl Coordinate {
  pub fn parse(s: &str) -> Result<Self, CoordinateError> {
    let (gav, extension) = s.rsplit_once('@').ok_or_else(|| CoordinateError::Format(s.to_string()))?;
    let parts: Vec<&str> = gav.split(':').collect();
    let [organization, artifact, selector] = parts.as_slice() else {
      return Err(CoordinateError::Format(s.to_string()));
    };

    for (part, value) in [
      ("organization", organization),
      ("artifact", artifact),
      ("selector", selector),
      ("extension", &extension),
    ] {
      if value.trim().is_empty() {
        return Err(CoordinateError::EmptyPart {
          coordinate: s.to_string(),
          part,
        });
      }
    }

    let selector = match selector.strip_suffix('+') {
      Some("") => Selector::Latest,
      Some(prefix) => Selector::Prefix(prefix.to_string()),
      None => Selector::Exact(selector.to_string()),
    };

    Ok(Self {
      organization: organization.to_string(),
      artifact: artifact.to_string(),
      selector,
      extension: extension.to_string(),
    })
  }
}

impl FromStr for Coordinate {
  type Err = CoordinateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}:{}@{}",
      self.organization, self.artifact, self.selector, self.extension
    )
  }
}

/// A coordinate plus the rule that rejects unwanted candidate versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
  pub coordinate: Coordinate,
  /// A candidate containing any of these substrings is rejected.
  pub rejections: Vec<String>,
}

impl VersionSpec {
  pub fn new(coordinate: Coordinate, rejections: Vec<String>) -> Self {
    Self { coordinate, rejections }
  }

  /// Whether `version` passes both the selector and the rejection rule.
  pub fn accepts(&self, version: &str) -> bool {
    self.coordinate.selector.matches(version) && self.rejection_reason(version).is_none()
  }

  /// The rejection substring `version` contains, if any.
  pub fn rejection_reason(&self, version: &str) -> Option<&str> {
    self
      .rejections
      .iter()
      .map(String::as_str)
      .find(|marker| !marker.is_empty() && version.contains(marker))
  }
}

/// The selected version and the local path of its archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
  pub version: String,
  pub archive_path: PathBuf,
}
