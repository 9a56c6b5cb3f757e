//! Shared helpers for pipeline integration tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use distpack_lib::compose::InjectedFile;
use distpack_lib::fingerprint::FileStore;
use distpack_lib::pipeline::{ArchiveName, OutputLayout, Pipeline, PipelineError, PipelineOptions, PipelineReport};
use distpack_lib::resolve::{ArtifactPattern, Coordinate, DirectoryRepository, VersionSpec, resolve};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A mirror directory, an output directory and some injectable files.
pub struct Workspace {
  pub temp: TempDir,
}

impl Workspace {
  pub fn new() -> Self {
    let workspace = Self {
      temp: TempDir::new().unwrap(),
    };
    fs::create_dir_all(workspace.mirror()).unwrap();
    workspace
  }

  pub fn mirror(&self) -> PathBuf {
    self.temp.path().join("mirror")
  }

  pub fn out(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  /// Publish `gradle-<version>-bin.zip` into the mirror.
  pub fn publish(&self, version: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = self.mirror().join(format!("gradle-{version}-bin.zip"));
    write_zip(&path, entries);
    path
  }

  /// Write a file under the workspace and return its path.
  pub fn write(&self, rel: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
  }

  pub fn pipeline(&self) -> Pipeline {
    Pipeline::new(
      OutputLayout::new(self.out()),
      ArchiveName::new("dist").with_appendix("gradle").with_classifier("bin"),
    )
  }

  /// Resolve against the mirror and run the pipeline with a store reopened from disk,
  /// the way two separate invocations would.
  pub fn build(&self, injected: &[InjectedFile], options: PipelineOptions) -> Result<PipelineReport, PipelineError> {
    let spec = VersionSpec::new(Coordinate::parse("gradle:bin:+@zip").unwrap(), vec!["-".to_string()]);
    let repo = DirectoryRepository::new(self.mirror(), ArtifactPattern::default());
    let artifact = resolve(&spec, &repo).unwrap();

    let pipeline = self.pipeline().with_options(options);
    let mut store = FileStore::open(pipeline.layout().fingerprints_path());
    pipeline.run(&mut store, &artifact, injected)
  }
}

pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
  let file = File::create(path).unwrap();
  let mut zip = zip::ZipWriter::new(file);
  for (name, bytes) in entries {
    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
    zip.write_all(bytes).unwrap();
  }
  zip.finish().unwrap();
}

/// Entry names of a zip archive in stored order.
pub fn entry_names(path: &Path) -> Vec<String> {
  let mut zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
  (0..zip.len()).map(|i| zip.by_index(i).unwrap().name().to_string()).collect()
}

/// Relative paths of all regular files under `root`, sorted.
pub fn tree_files(root: &Path) -> Vec<String> {
  let mut files: Vec<String> = walkdir::WalkDir::new(root)
    .into_iter()
    .map(|e| e.unwrap())
    .filter(|e| e.file_type().is_file())
    .map(|e| {
      e.path()
        .strip_prefix(root)
        .unwrap()
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
    })
    .collect();
  files.sort();
  files
}
