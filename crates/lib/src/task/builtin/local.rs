use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("local").required("name").attribute("value")
}

/// Binds a property in the innermost local scope.
///
/// Without `value` the binding hides any outer value until something sets it.
#[derive(Debug, Default)]
pub struct Local {
  name: String,
  value: Option<String>,
}

impl Task for Local {
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
    match name {
      "name" => self.name = value.to_string(),
      "value" => self.value = Some(value.to_string()),
      _ => {}
    }
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    ctx.properties().add_local(&self.name, self.value.take())?;
    Ok(())
  }
}
