use crate::event::{MessageLevel, MessageSource};
use crate::execute::Executor;
use crate::model::{Project, TaskDescriptor};
use crate::property::PropertyStore;

use super::TaskError;

/// What a running task can reach: the project, its properties, logging, and
/// the executor for nested tasks.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
  executor: &'a Executor<'a>,
  task: &'a TaskDescriptor,
  label: &'a str,
}

impl<'a> TaskContext<'a> {
  pub(crate) fn new(executor: &'a Executor<'a>, task: &'a TaskDescriptor, label: &'a str) -> Self {
    Self { executor, task, label }
  }

  pub fn project(&self) -> &'a Project {
    self.executor.project()
  }

  pub fn properties(&self) -> &'a PropertyStore {
    self.project().properties()
  }

  /// The descriptor this task was configured from.
  pub fn descriptor(&self) -> &'a TaskDescriptor {
    self.task
  }

  /// The name shown in log prefixes.
  pub fn label(&self) -> &'a str {
    self.label
  }

  pub fn executor(&self) -> &'a Executor<'a> {
    self.executor
  }

  /// Publish a message attributed to this task.
  pub fn log(&self, level: MessageLevel, text: &str) -> Result<(), TaskError> {
    let source = MessageSource::Task {
      task: self.task,
      label: self.label,
    };
    self.project().bus().message(source, level, text)?;
    Ok(())
  }

  pub fn info(&self, text: &str) -> Result<(), TaskError> {
    self.log(MessageLevel::Info, text)
  }

  /// Expand property references against the current properties.
  pub fn expand(&self, text: &str) -> Result<String, TaskError> {
    Ok(self.properties().expand(text)?)
  }

  /// Configure and run a nested task, with its own started/finished events.
  pub fn run_task(&self, task: &TaskDescriptor) -> Result<(), TaskError> {
    self.executor.run_task(task)?;
    Ok(())
  }
}
