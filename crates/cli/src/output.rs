//! Terminal output for distpack commands.
//!
//! Human output is a marker-prefixed line per event: `✓` for a finished
//! build or a matching archive, `✗` for a failure, `→` for a stage that ran
//! and a dimmed `•` for one that was up to date. `-o json` prints the
//! command's result as a single pretty-printed document instead.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream, Style};

use distpack_lib::pipeline::StageReport;

/// Hex digits of a sha-256 digest shown in human output.
const SHORT_DIGEST_LEN: usize = 12;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Leading part of a digest, enough to tell builds apart at a glance.
pub fn short_digest(digest: &str) -> &str {
  digest.get(..SHORT_DIGEST_LEN).unwrap_or(digest)
}

fn marked(marker: &str, style: Style, message: &str) -> String {
  format!("{} {message}", marker.if_supports_color(Stream::Stdout, |m| m.style(style)))
}

pub fn print_success(message: &str) {
  println!("{}", marked("✓", Style::new().green(), message));
}

/// Failures go to stderr so `-o json` output stays parseable.
pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    "✗".if_supports_color(Stream::Stderr, |m| m.red()),
    message.if_supports_color(Stream::Stderr, |m| m.red())
  );
}

pub fn print_info(message: &str) {
  println!("{}", marked("•", Style::new().blue(), message));
}

/// Indented `label: value` line under a status line.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {value}", label.if_supports_color(Stream::Stdout, |l| l.dimmed()));
}

/// `compose    executed    3f9a0c1d2e4b`
pub fn print_stage(report: &StageReport) {
  let line = format!(
    "{:<10} {:<11} {}",
    report.stage.as_str(),
    report.status.to_string(),
    short_digest(report.fingerprint.as_str())
  );
  if report.status.is_executed() {
    println!("{}", marked("→", Style::new().cyan(), &line));
  } else {
    println!("{}", marked("•", Style::new().dimmed(), &line));
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{json}");
  Ok(())
}
