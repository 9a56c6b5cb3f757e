//! Shared test helpers for CLI integration tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Config resolving the newest stable `gradle` `bin` zip from `mirror/`,
/// injecting `init.cfg` and writing to `out/`.
pub const CONFIG: &str = r#"
[distribution]
coordinate = "gradle:bin:+@zip"

[repository]
path = "mirror"

[[inject]]
source = "init.cfg"
destination = "init.d/init.cfg"

[output]
dir = "out"
base_name = "dist"
classifier = "bin"
"#;

/// Isolated test environment.
///
/// Each test gets its own directory holding the config, a local mirror and
/// the output directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Environment with [`CONFIG`], an injected file and an empty mirror.
  pub fn new() -> Self {
    let env = Self::empty();
    env.write_file("distpack.toml", CONFIG);
    env.write_file("init.cfg", "repositories { mavenCentral() }\n");
    fs::create_dir_all(env.mirror_path()).unwrap();
    env
  }

  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn mirror_path(&self) -> PathBuf {
    self.temp.path().join("mirror")
  }

  pub fn output_path(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  /// Path the archive for `version` is written to.
  pub fn archive_path(&self, version: &str) -> PathBuf {
    self.output_path().join(format!("dist-{version}-bin.zip"))
  }

  /// Publish `gradle-<version>-bin.zip` with a single top-level directory.
  pub fn publish(&self, version: &str) {
    let launcher = format!("gradle-{version}/bin/gradle");
    let library = format!("gradle-{version}/lib/core.jar");
    self.publish_entries(
      version,
      &[(launcher.as_str(), b"#!/bin/sh\n".as_slice()), (library.as_str(), b"jar".as_slice())],
    );
  }

  pub fn publish_entries(&self, version: &str, entries: &[(&str, &[u8])]) {
    let path = self.mirror_path().join(format!("gradle-{version}-bin.zip"));
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
      zip.start_file(*name, SimpleFileOptions::default()).unwrap();
      zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
  }

  /// Command running in the environment's directory with an isolated cache.
  pub fn distpack_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("distpack");
    cmd
      .current_dir(self.temp.path())
      .env("DISTPACK_CACHE_DIR", self.temp.path().join("cache"))
      .env_remove("DISTPACK_OUTPUT_DIR")
      .env_remove("RUST_LOG");
    cmd
  }
}
