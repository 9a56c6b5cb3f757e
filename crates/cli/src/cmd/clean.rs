use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use distpack_lib::config::Config;
use distpack_lib::consts::STATE_DIR;
use distpack_lib::lock::BuildLock;

use crate::output::{print_info, print_success};

pub fn cmd_clean(config_path: &Path) -> Result<()> {
  let config = Config::load(config_path).context("Failed to load configuration")?;
  let layout = config.layout();
  let dir = layout.dir();

  if !dir.exists() {
    print_info(&format!("Nothing to clean at {}", dir.display()));
    return Ok(());
  }

  {
    let _lock = BuildLock::acquire(&layout.state_dir(), "clean").context("Failed to acquire build lock")?;
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
      let entry = entry?;
      if entry.file_name() == STATE_DIR {
        continue;
      }
      let path = entry.path();
      let result = if entry.file_type()?.is_dir() {
        fs::remove_dir_all(&path)
      } else {
        fs::remove_file(&path)
      };
      result.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
  }

  // The lock file lives in the state directory, so it goes last.
  fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
  print_success(&format!("Removed {}", dir.display()));
  Ok(())
}
