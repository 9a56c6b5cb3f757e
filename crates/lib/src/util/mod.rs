//! Shared utilities.
//!
//! Content hashing, the regular-file tree walk, and test helpers.

pub mod hash;
pub mod tree;

#[cfg(test)]
pub mod testutil;
