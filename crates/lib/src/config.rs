//! `distpack.toml` configuration.
//!
//! ```toml
//! [distribution]
//! coordinate = "gradle:bin:+@zip"
//! reject = ["-"]
//!
//! [repository]
//! url = "https://services.gradle.org/distributions/"
//! pattern = "[organization]-[revision]-[artifact].[ext]"
//!
//! [[inject]]
//! source = "init.d/company.init.gradle.kts"
//! destination = "init.d/company.init.gradle.kts"
//!
//! [output]
//! dir = "build/distribution"
//! base_name = "company"
//! appendix = "gradle"
//! classifier = "bin"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! `DISTPACK_OUTPUT_DIR` replaces `output.dir`; `DISTPACK_CACHE_DIR` replaces
//! the download cache directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::compose::InjectedFile;
use crate::pipeline::{ArchiveName, OutputLayout};
use crate::platform::paths::cache_dir;
use crate::resolve::{
  ArtifactPattern, Coordinate, DEFAULT_PATTERN, DirectoryRepository, HttpRepository, Repository, ResolveError,
  VersionSpec,
};

/// Environment variable that replaces `output.dir`.
pub const OUTPUT_DIR_ENV: &str = "DISTPACK_OUTPUT_DIR";

const DEFAULT_OUTPUT_DIR: &str = "build/distribution";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid TOML in {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for '{field}' in {path}: {reason}")]
  Invalid {
    path: PathBuf,
    field: String,
    reason: String,
  },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
  distribution: DistributionSection,
  repository: RepositorySection,
  #[serde(default)]
  inject: Vec<InjectSection>,
  #[serde(default)]
  output: OutputSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DistributionSection {
  coordinate: String,
  #[serde(default = "default_reject")]
  reject: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RepositorySection {
  path: Option<PathBuf>,
  url: Option<String>,
  #[serde(default = "default_pattern")]
  pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InjectSection {
  source: PathBuf,
  destination: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputSection {
  #[serde(default = "default_output_dir")]
  dir: PathBuf,
  base_name: Option<String>,
  appendix: Option<String>,
  classifier: Option<String>,
  #[serde(default = "default_extension")]
  extension: String,
  file_name: Option<String>,
}

impl Default for OutputSection {
  fn default() -> Self {
    Self {
      dir: default_output_dir(),
      base_name: None,
      appendix: None,
      classifier: None,
      extension: default_extension(),
      file_name: None,
    }
  }
}

fn default_reject() -> Vec<String> {
  vec!["-".to_string()]
}

fn default_pattern() -> String {
  DEFAULT_PATTERN.to_string()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_extension() -> String {
  "zip".to_string()
}

/// Where candidate archives come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySource {
  Directory(PathBuf),
  Http(String),
}

/// Validated configuration with every path resolved.
#[derive(Debug, Clone)]
pub struct Config {
  /// The file this configuration was read from.
  pub path: PathBuf,
  pub spec: VersionSpec,
  pub repository: RepositorySource,
  pub pattern: ArtifactPattern,
  pub injected: Vec<InjectedFile>,
  pub output_dir: PathBuf,
  pub archive_name: ArchiveName,
  pub cache_dir: PathBuf,
}

impl Config {
  /// Read and validate the configuration file at `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let config = Self::parse(&content, &path)?;
    debug!(path = ?path, injected = config.injected.len(), "loaded config");
    Ok(config)
  }

  /// Parse configuration text as if it were read from `path`.
  pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
    let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    let base_dir = match path.parent() {
      Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
      _ => PathBuf::from("."),
    };
    let invalid = |field: &str, reason: String| ConfigError::Invalid {
      path: path.to_path_buf(),
      field: field.to_string(),
      reason,
    };

    let coordinate =
      Coordinate::parse(&file.distribution.coordinate).map_err(|e| invalid("distribution.coordinate", e.to_string()))?;
    let spec = VersionSpec::new(coordinate, file.distribution.reject);

    let repository = match (file.repository.path, file.repository.url) {
      (Some(dir), None) => RepositorySource::Directory(base_dir.join(dir)),
      (None, Some(url)) => RepositorySource::Http(url),
      (Some(_), Some(_)) => return Err(invalid("repository", "set either 'path' or 'url', not both".to_string())),
      (None, None) => return Err(invalid("repository", "one of 'path' or 'url' is required".to_string())),
    };
    let pattern =
      ArtifactPattern::new(file.repository.pattern).map_err(|e| invalid("repository.pattern", e.to_string()))?;

    let mut injected = Vec::with_capacity(file.inject.len());
    for (i, entry) in file.inject.into_iter().enumerate() {
      let file = InjectedFile::new(base_dir.join(entry.source), entry.destination);
      file
        .validate()
        .map_err(|e| invalid(&format!("inject[{i}].destination"), e.to_string()))?;
      injected.push(file);
    }

    let output = file.output;
    let base_name = output.base_name.unwrap_or_else(|| spec.coordinate.organization.clone());
    for (field, value) in [
      ("output.base_name", Some(&base_name)),
      ("output.extension", Some(&output.extension)),
      ("output.file_name", output.file_name.as_ref()),
    ] {
      if let Some(value) = value
        && value.contains(['/', '\\'])
      {
        return Err(invalid(field, format!("'{value}' must not contain path separators")));
      }
    }
    if let Some(file_name) = &output.file_name
      && OutputLayout::is_reserved(file_name)
    {
      return Err(invalid(
        "output.file_name",
        format!("'{file_name}' is reserved by the output directory layout"),
      ));
    }
    if base_name.is_empty() && output.file_name.is_none() {
      return Err(invalid("output.base_name", "must not be empty".to_string()));
    }

    let archive_name = ArchiveName {
      base_name,
      appendix: output.appendix,
      classifier: output.classifier,
      extension: output.extension,
      file_name: output.file_name,
    };

    let output_dir = match std::env::var_os(OUTPUT_DIR_ENV) {
      Some(dir) => PathBuf::from(dir),
      None => base_dir.join(output.dir),
    };

    Ok(Self {
      path: path.to_path_buf(),
      spec,
      repository,
      pattern,
      injected,
      output_dir,
      archive_name,
      cache_dir: cache_dir(),
    })
  }

  pub fn layout(&self) -> OutputLayout {
    OutputLayout::new(&self.output_dir)
  }

  /// Build the configured repository.
  pub fn open_repository(&self) -> Result<Box<dyn Repository>, ResolveError> {
    let repository: Box<dyn Repository> = match &self.repository {
      RepositorySource::Directory(dir) => Box::new(DirectoryRepository::new(dir, self.pattern.clone())),
      RepositorySource::Http(url) => Box::new(HttpRepository::new(url, self.pattern.clone(), &self.cache_dir)?),
    };
    Ok(repository)
  }
}
