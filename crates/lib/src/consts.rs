//! Crate-wide constants.

/// Application name, used for platform directories and environment variables.
pub const APP_NAME: &str = "distpack";

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "distpack.toml";

/// Directory under the output directory that holds pipeline state.
pub const STATE_DIR: &str = ".distpack";

/// Fingerprint record file name inside [`STATE_DIR`].
pub const FINGERPRINTS_FILENAME: &str = "fingerprints.json";

/// Build lock file name inside [`STATE_DIR`].
pub const LOCK_FILENAME: &str = "lock";

/// Directory under the output directory that holds the composed tree.
pub const COMPOSED_DIR: &str = "src";

/// Extension appended to the archive file name for the checksum sibling.
pub const CHECKSUM_EXTENSION: &str = "sha256";
