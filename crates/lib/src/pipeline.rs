//! Packaging pipeline.
//!
//! Runs the three stages in order, each behind the incremental gate:
//!
//! ```text
//! ResolvedArtifact ──► compose ──► archive ──► checksum
//!    + injected files   src/       <name>.zip  <name>.zip.sha256
//! ```
//!
//! Each stage's inputs include the content of the previous stage's output, so a
//! change anywhere upstream invalidates every stage after it. The first failing
//! stage aborts the run and is named in the error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{ENTRY_MODE, build_archive};
use crate::checksum::{ChecksumError, checksum_path, read_checksum, verify_checksum, write_checksum};
use crate::compose::{ComposedDistribution, InjectedFile, compose};
use crate::consts::{COMPOSED_DIR, FINGERPRINTS_FILENAME, STATE_DIR};
use crate::fingerprint::{FingerprintInput, FingerprintStore};
use crate::resolve::ResolvedArtifact;
use crate::stage::{IncrementalStage, Stage, StageError, StageId, StageStatus};
use crate::util::hash::ContentHash;
use crate::util::tree::to_archive_path;

pub const COMPOSE_STAGE: &str = "compose";
pub const ARCHIVE_STAGE: &str = "archive";
pub const CHECKSUM_STAGE: &str = "checksum";

/// How the archive file is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
  pub base_name: String,
  pub appendix: Option<String>,
  pub classifier: Option<String>,
  pub extension: String,
  /// Fixed literal name, used instead of the derived one.
  pub file_name: Option<String>,
}

impl ArchiveName {
  pub fn new(base_name: impl Into<String>) -> Self {
    Self {
      base_name: base_name.into(),
      appendix: None,
      classifier: None,
      extension: "zip".to_string(),
      file_name: None,
    }
  }

  pub fn with_appendix(mut self, appendix: impl Into<String>) -> Self {
    self.appendix = Some(appendix.into());
    self
  }

  pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
    self.classifier = Some(classifier.into());
    self
  }

  pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
    self.file_name = Some(file_name.into());
    self
  }

  /// `base-appendix-version-classifier.extension`, skipping empty parts.
  pub fn file_name_for(&self, version: &str) -> String {
    if let Some(fixed) = &self.file_name {
      return fixed.clone();
    }

    let parts = [
      Some(self.base_name.as_str()),
      self.appendix.as_deref(),
      Some(version),
      self.classifier.as_deref(),
    ];
    let stem = parts
      .into_iter()
      .flatten()
      .filter(|p| !p.is_empty())
      .collect::<Vec<_>>()
      .join("-");

    if self.extension.is_empty() {
      stem
    } else {
      format!("{stem}.{}", self.extension)
    }
  }
}

/// Paths under the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
  dir: PathBuf,
}

impl OutputLayout {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Composed tree; its single child is the distribution's top-level directory.
  pub fn composed_dir(&self) -> PathBuf {
    self.dir.join(COMPOSED_DIR)
  }

  pub fn state_dir(&self) -> PathBuf {
    self.dir.join(STATE_DIR)
  }

  pub fn fingerprints_path(&self) -> PathBuf {
    self.state_dir().join(FINGERPRINTS_FILENAME)
  }

  pub fn archive_path(&self, file_name: &str) -> PathBuf {
    self.dir.join(file_name)
  }

  /// Whether an archive named `file_name` would land on a path the layout
  /// already uses, or outside the output directory.
  pub fn is_reserved(file_name: &str) -> bool {
    matches!(file_name, "" | "." | ".." | COMPOSED_DIR | STATE_DIR) || file_name.contains(['/', '\\'])
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
  /// Execute every stage regardless of recorded fingerprints.
  pub rerun: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage: StageId,
  pub status: StageStatus,
  pub fingerprint: ContentHash,
}

/// Durable outputs of a run plus what each stage did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
  pub version: String,
  pub archive: PathBuf,
  pub checksum: PathBuf,
  pub digest: ContentHash,
  pub stages: Vec<StageReport>,
}

impl PipelineReport {
  pub fn executed(&self) -> usize {
    self.stages.iter().filter(|s| s.status.is_executed()).count()
  }

  pub fn status_of(&self, stage: &str) -> Option<StageStatus> {
    self.stages.iter().find(|s| s.stage.as_str() == stage).map(|s| s.status)
  }
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("stage `{stage}` failed: {source}")]
  Stage {
    stage: StageId,
    #[source]
    source: StageError,
  },
}

impl PipelineError {
  pub fn stage(&self) -> &StageId {
    match self {
      PipelineError::Stage { stage, .. } => stage,
    }
  }
}

/// Unpack the resolved archive and merge injected files.
pub struct ComposeStage<'a> {
  artifact: &'a ResolvedArtifact,
  injected: &'a [InjectedFile],
  dest: PathBuf,
}

impl<'a> ComposeStage<'a> {
  pub fn new(artifact: &'a ResolvedArtifact, injected: &'a [InjectedFile], dest: PathBuf) -> Self {
    Self {
      artifact,
      injected,
      dest,
    }
  }
}

impl Stage for ComposeStage<'_> {
  type Output = ComposedDistribution;

  fn id(&self) -> StageId {
    StageId::new(COMPOSE_STAGE)
  }

  fn inputs(&self) -> Vec<FingerprintInput> {
    let mut inputs = vec![
      FingerprintInput::file("archive", &self.artifact.archive_path),
      FingerprintInput::value("version", &self.artifact.version),
    ];
    for (i, file) in self.injected.iter().enumerate() {
      inputs.push(FingerprintInput::file(format!("inject.{i}.content"), &file.source));
      inputs.push(FingerprintInput::value(
        format!("inject.{i}.destination"),
        to_archive_path(&file.destination),
      ));
    }
    inputs
  }

  fn outputs(&self) -> Vec<PathBuf> {
    vec![self.dest.clone()]
  }

  fn execute(&self) -> Result<(), StageError> {
    compose(&self.artifact.archive_path, self.injected, &self.dest)?;
    Ok(())
  }

  fn output(&self) -> Result<ComposedDistribution, StageError> {
    Ok(ComposedDistribution::open(&self.dest)?)
  }
}

/// Pack the composed tree into the archive.
pub struct ArchiveStage<'a> {
  composed: &'a ComposedDistribution,
  version: &'a str,
  dest: PathBuf,
}

impl<'a> ArchiveStage<'a> {
  pub fn new(composed: &'a ComposedDistribution, version: &'a str, dest: PathBuf) -> Self {
    Self { composed, version, dest }
  }
}

impl Stage for ArchiveStage<'_> {
  type Output = PathBuf;

  fn id(&self) -> StageId {
    StageId::new(ARCHIVE_STAGE)
  }

  fn inputs(&self) -> Vec<FingerprintInput> {
    vec![
      FingerprintInput::tree("tree", &self.composed.root),
      FingerprintInput::value("version", self.version),
      FingerprintInput::value(
        "file_name",
        self.dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
      ),
      FingerprintInput::value("format", format!("zip;deflate;mode={ENTRY_MODE:o};mtime=1980-01-01")),
    ]
  }

  fn outputs(&self) -> Vec<PathBuf> {
    vec![self.dest.clone()]
  }

  fn execute(&self) -> Result<(), StageError> {
    build_archive(&self.composed.root, &self.dest)?;
    Ok(())
  }

  fn output(&self) -> Result<PathBuf, StageError> {
    Ok(self.dest.clone())
  }
}

/// Write the archive's digest next to it.
pub struct ChecksumStage {
  archive: PathBuf,
  dest: PathBuf,
}

impl ChecksumStage {
  pub fn new(archive: PathBuf) -> Result<Self, ChecksumError> {
    let dest = checksum_path(&archive)?;
    Ok(Self { archive, dest })
  }
}

impl Stage for ChecksumStage {
  type Output = (PathBuf, ContentHash);

  fn id(&self) -> StageId {
    StageId::new(CHECKSUM_STAGE)
  }

  fn inputs(&self) -> Vec<FingerprintInput> {
    vec![FingerprintInput::file("archive", &self.archive)]
  }

  fn outputs(&self) -> Vec<PathBuf> {
    vec![self.dest.clone()]
  }

  fn execute(&self) -> Result<(), StageError> {
    write_checksum(&self.archive)?;
    Ok(())
  }

  fn output(&self) -> Result<(PathBuf, ContentHash), StageError> {
    let digest = read_checksum(&self.archive)?;
    Ok((self.dest.clone(), ContentHash(digest)))
  }
}

/// The compose → archive → checksum orchestrator.
#[derive(Debug, Clone)]
pub struct Pipeline {
  layout: OutputLayout,
  name: ArchiveName,
  options: PipelineOptions,
}

impl Pipeline {
  pub fn new(layout: OutputLayout, name: ArchiveName) -> Self {
    Self {
      layout,
      name,
      options: PipelineOptions::default(),
    }
  }

  pub fn with_options(mut self, options: PipelineOptions) -> Self {
    self.options = options;
    self
  }

  pub fn layout(&self) -> &OutputLayout {
    &self.layout
  }

  /// Archive path for `version`.
  pub fn archive_path(&self, version: &str) -> PathBuf {
    self.layout.archive_path(&self.name.file_name_for(version))
  }

  pub fn run<S: FingerprintStore + ?Sized>(
    &self,
    store: &mut S,
    artifact: &ResolvedArtifact,
    injected: &[InjectedFile],
  ) -> Result<PipelineReport, PipelineError> {
    let file_name = self.name.file_name_for(&artifact.version);
    if OutputLayout::is_reserved(&file_name) {
      return Err(PipelineError::Stage {
        stage: StageId::new(ARCHIVE_STAGE),
        source: StageError::ReservedOutput {
          path: self.layout.archive_path(&file_name),
        },
      });
    }

    let mut gate = IncrementalStage::new(store).with_rerun(self.options.rerun);
    let mut stages = Vec::with_capacity(3);

    let compose = ComposeStage::new(artifact, injected, self.layout.composed_dir());
    let composed = run_gated(&mut gate, &compose, &mut stages)?;

    let archive = ArchiveStage::new(&composed, &artifact.version, self.layout.archive_path(&file_name));
    let mut archive_path = run_gated(&mut gate, &archive, &mut stages)?;

    // The gate only checks that the archive exists. Bytes that no longer match
    // the recorded checksum were changed outside the pipeline.
    if stages.last().is_some_and(|s| s.status == StageStatus::UpToDate) && modified_since_checksum(&archive_path) {
      warn!(archive = ?archive_path, "archive changed since it was built, rebuilding");
      fs::remove_file(&archive_path).map_err(|source| PipelineError::Stage {
        stage: StageId::new(ARCHIVE_STAGE),
        source: StageError::RemoveOutput {
          path: archive_path.clone(),
          source,
        },
      })?;
      stages.pop();
      archive_path = run_gated(&mut gate, &archive, &mut stages)?;
    }

    let checksum = ChecksumStage::new(archive_path.clone()).map_err(|e| PipelineError::Stage {
      stage: StageId::new(CHECKSUM_STAGE),
      source: e.into(),
    })?;
    let (checksum_path, digest) = run_gated(&mut gate, &checksum, &mut stages)?;

    let report = PipelineReport {
      version: artifact.version.clone(),
      archive: archive_path,
      checksum: checksum_path,
      digest,
      stages,
    };
    info!(
      version = %report.version,
      archive = ?report.archive,
      executed = report.executed(),
      "pipeline complete"
    );

    Ok(report)
  }
}

fn modified_since_checksum(archive: &Path) -> bool {
  matches!(verify_checksum(archive), Ok(verification) if !verification.is_match())
}

fn run_gated<S, T>(
  gate: &mut IncrementalStage<'_, S>,
  stage: &T,
  reports: &mut Vec<StageReport>,
) -> Result<T::Output, PipelineError>
where
  S: FingerprintStore + ?Sized,
  T: Stage,
{
  let id = stage.id();
  let run = gate
    .run_stage(stage)
    .map_err(|source| PipelineError::Stage { stage: id.clone(), source })?;

  info!(stage = %id, status = %run.status, "stage finished");
  reports.push(StageReport {
    stage: id,
    status: run.status,
    fingerprint: run.fingerprint,
  });
  Ok(run.output)
}

impl fmt::Display for PipelineReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for stage in &self.stages {
      writeln!(f, "{:<10} {}", stage.stage.as_str(), stage.status)?;
    }
    write!(f, "{} ({})", self.archive.display(), self.digest)
  }
}
