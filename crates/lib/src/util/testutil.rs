//! Test utilities for distpack-lib.
//!
//! Helpers that fabricate upstream distribution archives on disk.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

/// Write a zip archive containing the given `(name, bytes)` entries.
///
/// Names ending in `/` become directory entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
  let file = File::create(path).unwrap();
  let mut zip = zip::ZipWriter::new(file);
  let options = SimpleFileOptions::default();

  for (name, bytes) in entries {
    if name.ends_with('/') {
      zip.add_directory(*name, options).unwrap();
    } else {
      zip.start_file(*name, options).unwrap();
      zip.write_all(bytes).unwrap();
    }
  }

  zip.finish().unwrap();
}

/// Write a gzip-compressed tarball containing the given `(name, bytes)` entries.
pub fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
  let file = File::create(path).unwrap();
  let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
  let mut builder = tar::Builder::new(encoder);

  for (name, bytes) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_size(bytes.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, *bytes).unwrap();
  }

  builder.into_inner().unwrap().finish().unwrap();
}
