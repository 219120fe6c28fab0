use crate::event::MessageLevel;
use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("echo").attribute("message").attribute("level").text()
}

/// Logs a message at a chosen level.
///
/// The message comes from the `message` attribute, followed by any nested
/// text.
#[derive(Debug, Default)]
pub struct Echo {
  message: String,
  level: Option<MessageLevel>,
}

impl Task for Echo {
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
    match name {
      "message" => self.message = value.to_string(),
      "level" => {
        let level = value.parse().map_err(|reason| ConfigError::InvalidValue {
          attribute: name.to_string(),
          value: value.to_string(),
          reason,
        })?;
        self.level = Some(level);
      }
      _ => {}
    }
    Ok(())
  }

  fn add_text(&mut self, text: &str) -> Result<(), ConfigError> {
    self.message.push_str(text);
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    ctx.log(self.level.unwrap_or(MessageLevel::Info), &self.message)
  }
}
