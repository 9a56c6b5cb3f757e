//! Version ordering.
//!
//! Distribution versions are usually short (`8.5`, `8.6-rc-1`), so they are
//! padded to three numeric components before being compared as semver:
//!
//! | Input        | Compared as      |
//! |--------------|------------------|
//! | `8`          | `8.0.0`          |
//! | `8.5`        | `8.5.0`          |
//! | `1.1-rc1`    | `1.1.0-rc1`      |
//! | `8.5.1`      | `8.5.1`          |
//!
//! Versions that still fail to parse sort below every parseable version and
//! compare lexicographically among themselves.

use std::cmp::Ordering;

use semver::Version;

/// Parse a distribution version, padding missing minor/patch components.
pub fn parse_version(version: &str) -> Option<Version> {
  let (core, rest) = match version.find(['-', '+']) {
    Some(idx) => version.split_at(idx),
    None => (version, ""),
  };

  let mut parts: Vec<&str> = core.split('.').collect();
  if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
    return None;
  }
  while parts.len() < 3 {
    parts.push("0");
  }

  Version::parse(&format!("{}{}", parts.join("."), rest)).ok()
}

/// Total order over version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  match (parse_version(a), parse_version(b)) {
    (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
    (Some(_), None) => Ordering::Greater,
    (None, Some(_)) => Ordering::Less,
    (None, None) => a.cmp(b),
  }
}
