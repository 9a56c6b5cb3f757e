use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use distpack_lib::config::Config;
use distpack_lib::resolve::resolve_version;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct ResolveOutput {
  coordinate: String,
  repository: String,
  version: String,
  archive: String,
}

pub fn cmd_resolve(config_path: &Path, output: OutputFormat) -> Result<()> {
  let config = Config::load(config_path).context("Failed to load configuration")?;
  let repository = config.open_repository()?;
  let version = resolve_version(&config.spec, repository.as_ref()).context("Failed to resolve distribution")?;

  let result = ResolveOutput {
    coordinate: config.spec.coordinate.to_string(),
    repository: repository.location(),
    archive: config.archive_name.file_name_for(&version),
    version,
  };

  if output.is_json() {
    print_json(&result)?;
  } else {
    print_success(&format!("{} resolves to {}", result.coordinate, result.version));
    print_stat("Repository", &result.repository);
    print_stat("Archive", &result.archive);
  }

  Ok(())
}
