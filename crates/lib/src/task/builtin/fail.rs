use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("fail")
    .attribute("message")
    .attribute("if")
    .attribute("unless")
    .text()
}

/// Fails the build, optionally only when a property is (or is not) set.
#[derive(Debug, Default)]
pub struct Fail {
  message: Option<String>,
  if_property: Option<String>,
  unless_property: Option<String>,
}

impl Fail {
  fn should_fail(&self, ctx: &TaskContext<'_>) -> bool {
    let properties = ctx.properties();
    let if_ok = self.if_property.as_deref().is_none_or(|name| properties.is_set(name));
    let unless_ok = self.unless_property.as_deref().is_none_or(|name| !properties.is_set(name));
    if_ok && unless_ok
  }
}

impl Task for Fail {
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
    match name {
      "message" => self.message = Some(value.to_string()),
      "if" => self.if_property = Some(value.to_string()),
      "unless" => self.unless_property = Some(value.to_string()),
      _ => {}
    }
    Ok(())
  }

  fn add_text(&mut self, text: &str) -> Result<(), ConfigError> {
    let text = text.trim();
    if !text.is_empty() {
      self.message.get_or_insert_with(String::new).push_str(text);
    }
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    if !self.should_fail(ctx) {
      return Ok(());
    }
    Err(TaskError::failed(self.message.clone().unwrap_or_else(|| "No message".to_string())))
  }
}
