//! Types for target execution.
//!
//! This module defines the error type, the per-run report and the
//! configuration used by the [`Executor`](super::Executor).

use std::fmt;

use thiserror::Error;

use crate::event::PublishError;
use crate::graph::GraphError;
use crate::model::Location;
use crate::property::PropertyError;
use crate::task::{ConfigError, TaskError};

/// Why a target was not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDependency {
  /// The skipped target.
  pub target: String,
  /// The dependency that failed or was itself skipped.
  pub dependency: String,
}

impl fmt::Display for FailedDependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Cannot execute '{}' - '{}' failed or was not executed.",
      self.target, self.dependency
    )
  }
}

fn at(location: &Location) -> String {
  if location.is_unknown() {
    String::new()
  } else {
    format!("{location}: ")
  }
}

/// Errors that can occur while executing targets and tasks.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// Nothing was requested and the project has no default target.
  #[error("no target specified and the project has no default target")]
  NoTargetRequested,

  /// A task raised an error while running.
  #[error("{}{source}", at(.location))]
  TaskExecution {
    task: String,
    location: Location,
    source: TaskError,
  },

  /// A task could not be created or configured.
  #[error("{}{source}", at(.location))]
  Configuration {
    task: String,
    location: Location,
    source: ConfigError,
  },

  #[error(transparent)]
  Listener(#[from] PublishError),

  #[error(transparent)]
  Property(#[from] PropertyError),

  /// Summary error when targets failed under [`FailurePolicy::KeepGoing`].
  #[error("{count} target(s) failed")]
  Failed { count: usize },
}

impl ExecuteError {
  /// The error text without its location prefix.
  pub fn message(&self) -> String {
    match self {
      ExecuteError::TaskExecution { source, .. } => source.to_string(),
      ExecuteError::Configuration { source, .. } => source.to_string(),
      other => other.to_string(),
    }
  }
}

/// What to do when a target fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
  /// Stop at the first failing target.
  #[default]
  Halt,
  /// Keep running targets that do not depend on a failed one.
  KeepGoing,
}

/// Configuration for target execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteConfig {
  pub failure_policy: FailurePolicy,
}

impl ExecuteConfig {
  pub fn keep_going() -> Self {
    Self {
      failure_policy: FailurePolicy::KeepGoing,
    }
  }
}

/// Outcome of running an ordered list of targets.
#[derive(Debug, Default)]
pub struct RunReport {
  /// Targets that ran to completion (including skipped-by-condition ones),
  /// in execution order.
  pub completed: Vec<String>,

  /// Targets that failed, with their errors.
  pub failed: Vec<(String, ExecuteError)>,

  /// Targets not run because a dependency failed.
  pub skipped: Vec<FailedDependency>,
}

impl RunReport {
  /// Returns true if every target completed.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty()
  }

  /// Returns the total number of targets processed.
  pub fn total(&self) -> usize {
    self.completed.len() + self.failed.len() + self.skipped.len()
  }

  /// Whether `target` failed or was skipped.
  pub fn is_blocked(&self, target: &str) -> bool {
    self.failed.iter().any(|(name, _)| name == target) || self.skipped.iter().any(|skip| skip.target == target)
  }
}
