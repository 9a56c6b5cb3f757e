use crate::consts::APP_NAME;
use std::env;
use std::path::PathBuf;

/// Environment variable that replaces the download cache directory.
pub const CACHE_DIR_ENV: &str = "DISTPACK_CACHE_DIR";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  env::var_os("USERPROFILE").map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  env::var_os("HOME").map(PathBuf::from)
}

/// Returns the directory downloaded distributions are cached in.
///
/// `DISTPACK_CACHE_DIR` wins over the platform default.
pub fn cache_dir() -> PathBuf {
  if let Some(path) = env::var_os(CACHE_DIR_ENV) {
    return PathBuf::from(path);
  }
  default_cache_dir()
}

#[cfg(windows)]
fn default_cache_dir() -> PathBuf {
  env::var_os("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(env::temp_dir)
    .join(APP_NAME)
    .join("Cache")
}

#[cfg(not(windows))]
fn default_cache_dir() -> PathBuf {
  let cache_home = env::var_os("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .or_else(|| home_dir().map(|home| home.join(".cache")))
    .unwrap_or_else(env::temp_dir);
  cache_home.join(APP_NAME)
}
