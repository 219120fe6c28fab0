use crate::model::TaskDescriptor;
use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("sequential").nested_tasks()
}

/// Runs nested tasks in order inside a fresh local scope.
#[derive(Debug, Default)]
pub struct Sequential {
  tasks: Vec<TaskDescriptor>,
}

impl Task for Sequential {
  fn set_attribute(&mut self, _name: &str, _value: &str) -> Result<(), ConfigError> {
    Ok(())
  }

  fn add_task(&mut self, task: TaskDescriptor) -> Result<(), ConfigError> {
    self.tasks.push(task);
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    let _scope = ctx.properties().scope();
    for task in &self.tasks {
      ctx.run_task(task)?;
    }
    Ok(())
  }
}
