use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("property")
    .required("name")
    .attribute("value")
    .attribute("location")
}

/// Sets a property if it has no value yet.
///
/// `location` stores the path resolved against the project base directory.
#[derive(Debug, Default)]
pub struct PropertyTask {
  name: String,
  value: Option<String>,
  location: Option<String>,
}

impl Task for PropertyTask {
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
    match name {
      "name" => self.name = value.to_string(),
      "value" => self.value = Some(value.to_string()),
      "location" => self.location = Some(value.to_string()),
      _ => {}
    }
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    let value = match (self.value.take(), self.location.as_deref()) {
      (Some(value), None) => value,
      (None, Some(location)) => ctx.project().resolve_file(location).display().to_string(),
      (Some(_), Some(_)) => return Err(TaskError::failed("only one of value or location may be set")),
      (None, None) => return Err(TaskError::failed("you must specify value or location")),
    };
    ctx.properties().set_if_absent(&self.name, value);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::event::MessageLevel;
  use crate::util::testutil::run_build;

  #[test]
  fn first_definition_wins() {
    let run = run_build(
      r#"<project default="main">
        <property name="dist" value="first"/>
        <property name="dist" value="second"/>
        <target name="main"><echo message="${dist}"/></target>
      </project>"#,
    );
    run.result.unwrap();
    assert!(run.recorder.has_message(MessageLevel::Info, "first"));
    assert!(run.recorder.has_message(MessageLevel::Verbose, "Override ignored for property \"dist\""));
  }

  #[test]
  fn value_references_earlier_property() {
    let run = run_build(
      r#"<project default="main">
        <property name="name" value="tack"/>
        <property name="jar" value="${name}.jar"/>
        <target name="main"><echo message="${jar}"/></target>
      </project>"#,
    );
    run.result.unwrap();
    assert!(run.recorder.has_message(MessageLevel::Info, "tack.jar"));
  }

  #[test]
  fn missing_value_fails() {
    let run = run_build(r#"<project default="main"><target name="main"><property name="x"/></target></project>"#);
    assert!(run.result.unwrap_err().to_string().contains("value or location"));
  }
}
