//! Verify command implementation.
//!
//! Every `<archive>.sha256` in the output directory is checked against the
//! current bytes of its archive.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use distpack_lib::checksum::verify_checksum;
use distpack_lib::config::Config;
use distpack_lib::consts::CHECKSUM_EXTENSION;

use crate::output::{OutputFormat, print_error, print_json, print_success, short_digest};

#[derive(Serialize)]
struct VerifyEntry {
  archive: PathBuf,
  expected: String,
  actual: Option<String>,
  ok: bool,
}

pub fn cmd_verify(config_path: &Path, output: OutputFormat) -> Result<()> {
  let config = Config::load(config_path).context("Failed to load configuration")?;
  let archives = checksummed_archives(&config.output_dir)?;
  if archives.is_empty() {
    bail!("No checksum files found in {}", config.output_dir.display());
  }

  let mut entries = Vec::with_capacity(archives.len());
  for archive in archives {
    let entry = match verify_checksum(&archive) {
      Ok(verification) => VerifyEntry {
        ok: verification.is_match(),
        actual: Some(verification.actual.to_string()),
        expected: verification.expected,
        archive,
      },
      Err(e) => {
        tracing::debug!(archive = ?archive, error = %e, "verification failed");
        VerifyEntry {
          archive,
          expected: String::new(),
          actual: None,
          ok: false,
        }
      }
    };
    entries.push(entry);
  }

  let failures = entries.iter().filter(|e| !e.ok).count();

  if output.is_json() {
    print_json(&entries)?;
  } else {
    for entry in &entries {
      let name = entry.archive.display().to_string();
      match (&entry.actual, entry.ok) {
        (Some(actual), true) => print_success(&format!("{name} ({})", short_digest(actual))),
        (Some(actual), false) => print_error(&format!(
          "{name}: expected {}, found {}",
          short_digest(&entry.expected),
          short_digest(actual)
        )),
        (None, _) => print_error(&format!("{name}: archive missing or unreadable")),
      }
    }
  }

  if failures > 0 {
    bail!("{failures} of {} archive(s) failed verification", entries.len());
  }
  Ok(())
}

/// Archives in `dir` that have a sibling checksum file.
fn checksummed_archives(dir: &Path) -> Result<Vec<PathBuf>> {
  let suffix = format!(".{CHECKSUM_EXTENSION}");
  let read = fs::read_dir(dir).with_context(|| format!("Failed to read output directory {}", dir.display()))?;

  let mut archives = Vec::new();
  for entry in read {
    let entry = entry?;
    let name = entry.file_name().to_string_lossy().to_string();
    if let Some(archive) = name.strip_suffix(&suffix)
      && !archive.is_empty()
    {
      archives.push(dir.join(archive));
    }
  }
  archives.sort();
  Ok(archives)
}
