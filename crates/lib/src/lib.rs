//! distpack-lib: incremental repackaging of upstream distribution archives.
//!
//! A run resolves a distribution version, then drives three gated stages:
//! - `compose`: unpack the archive and inject extra files into its top-level directory
//! - `archive`: repack the composed tree into a deterministic zip
//! - `checksum`: write the archive's SHA-256 digest next to it
//!
//! Each stage is skipped when the fingerprint of its declared inputs matches the
//! one recorded by its last successful run.

pub mod archive;
pub mod checksum;
pub mod compose;
pub mod config;
pub mod consts;
pub mod fingerprint;
pub mod lock;
pub mod pipeline;
pub mod platform;
pub mod resolve;
pub mod stage;
pub mod util;
