//! Shared utilities.

use std::path::{Path, PathBuf};

#[cfg(test)]
pub mod testutil;

/// Resolve `path` against `base` unless it is already absolute.
///
/// The result is canonicalized when the path exists.
pub fn resolve_against(base: &Path, path: impl AsRef<Path>) -> PathBuf {
  let path = path.as_ref();
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  };
  dunce::canonicalize(&joined).unwrap_or(joined)
}

/// Interpret a boolean attribute value. Returns `None` for anything that is
/// not a recognised spelling.
pub fn parse_bool(value: &str) -> Option<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "true" | "yes" | "on" => Some(true),
    "false" | "no" | "off" => Some(false),
    _ => None,
  }
}
