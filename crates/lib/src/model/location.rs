use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A position in a build file. Lines and columns start at 1; zero means
/// unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
  pub file: Option<PathBuf>,
  pub line: u32,
  pub column: u32,
}

impl Location {
  pub fn new(file: Option<PathBuf>, line: u32, column: u32) -> Self {
    Self { file, line, column }
  }

  pub fn is_unknown(&self) -> bool {
    self.file.is_none() && self.line == 0
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.file, self.line) {
      (Some(file), 0) => write!(f, "{}", file.display()),
      (Some(file), line) => write!(f, "{}:{}:{}", file.display(), line, self.column),
      (None, 0) => f.write_str("<unknown>"),
      (None, line) => write!(f, "{}:{}", line, self.column),
    }
  }
}
