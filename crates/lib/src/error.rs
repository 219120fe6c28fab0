//! Top-level error type for a complete build.

use thiserror::Error;

use crate::execute::ExecuteError;
use crate::parse::ParseError;

/// Errors from reading or running a build file.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}
