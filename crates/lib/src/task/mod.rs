//! Pluggable tasks.
//!
//! A task is a named, attribute-configurable unit of work. The engine knows
//! tasks only through a [`TaskFactory`], which describes the attributes and
//! nested elements the task accepts ([`TaskSchema`]) and creates fresh
//! instances. Each time a task descriptor runs, a new instance is created,
//! configured from the expanded descriptor, and executed with a
//! [`TaskContext`].
//!
//! # Configuration Order
//!
//! 1. `set_attribute` for every attribute, in document order
//! 2. `add_text` if the element has character data
//! 3. `add_element` / `add_task` for every child, in document order
//! 4. `execute`

pub mod builtin;
mod context;
mod registry;
mod schema;

pub use context::TaskContext;
pub use registry::{FnFactory, TaskRegistry};
pub use schema::{Multiplicity, TaskSchema};

use thiserror::Error;

use crate::event::PublishError;
use crate::execute::ExecuteError;
use crate::model::{Location, TaskDescriptor};
use crate::property::PropertyError;

/// A nested configuration element after property expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredElement {
  pub name: String,
  pub attributes: Vec<(String, String)>,
  pub text: Option<String>,
  pub children: Vec<ConfiguredElement>,
  pub location: Location,
}

impl ConfiguredElement {
  pub fn attribute(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }
}

/// Errors raised while binding a descriptor to a task instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("problem: failed to create task or type {0}")]
  UnknownTask(String),

  #[error("{task} doesn't support the \"{attribute}\" attribute")]
  UnknownAttribute { task: String, attribute: String },

  #[error("{task} requires the \"{attribute}\" attribute")]
  MissingAttribute { task: String, attribute: String },

  #[error("{task} doesn't support the nested \"{element}\" element")]
  UnknownElement { task: String, element: String },

  #[error("{task} accepts only one nested \"{element}\" element")]
  DuplicateElement { task: String, element: String },

  #[error("{task} doesn't support nested text data (\"{text}\")")]
  UnexpectedText { task: String, text: String },

  #[error("invalid value \"{value}\" for attribute \"{attribute}\": {reason}")]
  InvalidValue {
    attribute: String,
    value: String,
    reason: String,
  },

  #[error(transparent)]
  Property(#[from] PropertyError),
}

/// Errors raised by a running task.
#[derive(Debug, Error)]
pub enum TaskError {
  /// The task decided the build should fail.
  #[error("{0}")]
  Failed(String),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Property(#[from] PropertyError),

  #[error(transparent)]
  Listener(#[from] PublishError),

  /// A nested task failed. The inner error already names the nested task.
  #[error(transparent)]
  Nested(Box<ExecuteError>),
}

impl TaskError {
  pub fn failed(message: impl Into<String>) -> Self {
    TaskError::Failed(message.into())
  }
}

impl From<ExecuteError> for TaskError {
  fn from(err: ExecuteError) -> Self {
    TaskError::Nested(Box::new(err))
  }
}

/// A configurable, executable task instance.
pub trait Task: Send {
  /// Receive an expanded attribute. Only attributes the schema accepts are
  /// passed.
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError>;

  /// Receive expanded character data.
  fn add_text(&mut self, _text: &str) -> Result<(), ConfigError> {
    Ok(())
  }

  /// Receive an expanded nested element the schema declares.
  fn add_element(&mut self, element: ConfiguredElement) -> Result<(), ConfigError> {
    Err(ConfigError::UnknownElement {
      task: self.display_name().unwrap_or("task").to_string(),
      element: element.name,
    })
  }

  /// Receive a nested task. Nested tasks stay unconfigured until they run.
  fn add_task(&mut self, task: TaskDescriptor) -> Result<(), ConfigError> {
    Err(ConfigError::UnknownElement {
      task: self.display_name().unwrap_or("task").to_string(),
      element: task.name,
    })
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError>;

  /// Name shown in log prefixes instead of the element tag.
  fn display_name(&self) -> Option<&str> {
    None
  }
}

/// Creates task instances of one type.
pub trait TaskFactory: Send + Sync {
  fn schema(&self) -> &TaskSchema;

  fn create(&self) -> Box<dyn Task>;
}
