//! HTTP directory-listing repository.
//!
//! Versions are discovered by scraping `href` attributes from the index page at
//! the base URL and matching their last path segment against the artifact
//! pattern. Archives are downloaded into a local cache directory once; later
//! fetches of the same file name are served from the cache.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use reqwest::Url;
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::repository::{ArtifactPattern, Repository, versions_from_names};
use super::{Coordinate, ResolveError};

/// Repository served over HTTP, e.g. `https://services.gradle.org/distributions/`.
#[derive(Debug, Clone)]
pub struct HttpRepository {
  base: Url,
  pattern: ArtifactPattern,
  cache_dir: PathBuf,
  client: Client,
}

impl HttpRepository {
  pub fn new(base_url: &str, pattern: ArtifactPattern, cache_dir: impl Into<PathBuf>) -> Result<Self, ResolveError> {
    let mut base = Url::parse(base_url).map_err(|e| ResolveError::InvalidUrl {
      url: base_url.to_string(),
      reason: e.to_string(),
    })?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let client = Client::builder()
      .user_agent(concat!("distpack/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|source| ResolveError::Http {
        url: base_url.to_string(),
        source,
      })?;

    Ok(Self {
      base,
      pattern,
      cache_dir: cache_dir.into(),
      client,
    })
  }

  fn get(&self, url: &Url) -> Result<reqwest::blocking::Response, ResolveError> {
    let http_err = |source| ResolveError::Http {
      url: url.to_string(),
      source,
    };
    let response = self.client.get(url.clone()).send().map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
      return Err(ResolveError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }
    Ok(response)
  }
}

impl Repository for HttpRepository {
  fn location(&self) -> String {
    self.base.to_string()
  }

  fn list_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, ResolveError> {
    let body = self.get(&self.base)?.text().map_err(|source| ResolveError::Http {
      url: self.base.to_string(),
      source,
    })?;

    let names: Vec<&str> = hrefs(&body).filter_map(last_segment).collect();
    let versions = versions_from_names(&self.pattern, coordinate, names);
    debug!(repository = %self.base, count = versions.len(), "listed versions");
    Ok(versions)
  }

  fn fetch(&self, coordinate: &Coordinate, version: &str) -> Result<PathBuf, ResolveError> {
    let file_name = self.pattern.file_name(coordinate, version);
    let dest = self.cache_dir.join(&file_name);
    if dest.is_file() {
      debug!(path = ?dest, "artifact already cached");
      return Ok(dest);
    }

    let url = self.base.join(&file_name).map_err(|e| ResolveError::InvalidUrl {
      url: format!("{}{}", self.base, file_name),
      reason: e.to_string(),
    })?;
    info!(url = %url, "downloading artifact");

    let download_err = |source| ResolveError::Download {
      path: dest.clone(),
      source,
    };
    fs::create_dir_all(&self.cache_dir).map_err(download_err)?;
    let mut temp = NamedTempFile::new_in(&self.cache_dir).map_err(download_err)?;

    let mut response = self.get(&url)?;
    response.copy_to(&mut temp).map_err(|source| ResolveError::Http {
      url: url.to_string(),
      source,
    })?;
    temp.flush().map_err(download_err)?;
    temp.persist(&dest).map_err(|e| download_err(e.error))?;

    info!(path = ?dest, "downloaded artifact");
    Ok(dest)
  }
}

/// Iterate over `href` attribute values in an HTML page.
fn hrefs(html: &str) -> impl Iterator<Item = &str> {
  html.split("href=").skip(1).filter_map(|rest| {
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
  })
}

/// Last path segment of a link, without query or fragment.
fn last_segment(href: &str) -> Option<&str> {
  let path = href.split(['?', '#']).next()?;
  path.rsplit('/').next().filter(|s| !s.is_empty())
}
