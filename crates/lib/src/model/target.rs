use crate::property::{PropertyError, PropertyStore};

use super::{Location, TaskDescriptor};

/// A named group of tasks with dependencies on other targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
  pub name: String,
  /// Dependencies in declared order.
  pub depends: Vec<String>,
  pub if_condition: Option<String>,
  pub unless_condition: Option<String>,
  pub description: Option<String>,
  pub tasks: Vec<TaskDescriptor>,
  pub location: Location,
}

impl Target {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Builder-style dependency setter.
  pub fn with_depends<I, S>(mut self, depends: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.depends = depends.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_task(mut self, task: TaskDescriptor) -> Self {
    self.add_task(task);
    self
  }

  pub fn add_task(&mut self, mut task: TaskDescriptor) {
    task.set_owning_target(&self.name);
    self.tasks.push(task);
  }

  /// Whether this is the implicit target holding top-level tasks.
  pub fn is_implicit(&self) -> bool {
    self.name.is_empty()
  }

  /// Split a comma-separated dependency list.
  ///
  /// Entries are trimmed. An empty list yields no dependencies, but an empty
  /// entry inside a list is an error.
  pub fn parse_depends(list: &str) -> Result<Vec<String>, String> {
    if list.trim().is_empty() {
      return Ok(Vec::new());
    }
    list
      .split(',')
      .map(|entry| {
        let entry = entry.trim();
        if entry.is_empty() {
          Err(format!("syntax error in depends attribute \"{list}\": empty target name"))
        } else {
          Ok(entry.to_string())
        }
      })
      .collect()
  }

  /// Evaluate the `if`/`unless` conditions.
  ///
  /// Returns the reason the target should be skipped, or `None` when it
  /// should run. Condition names are expanded before lookup.
  pub fn skip_reason(&self, properties: &PropertyStore) -> Result<Option<String>, PropertyError> {
    if let Some(condition) = &self.if_condition {
      let name = properties.expand(condition)?;
      if !name.is_empty() && !is_true(properties.get(&name).as_deref()) {
        return Ok(Some(format!("Skipped because property '{name}' not set.")));
      }
    }
    if let Some(condition) = &self.unless_condition {
      let name = properties.expand(condition)?;
      if !name.is_empty() && is_true(properties.get(&name).as_deref()) {
        return Ok(Some(format!("Skipped because property '{name}' set.")));
      }
    }
    Ok(None)
  }
}

fn is_true(value: Option<&str>) -> bool {
  matches!(value, Some(v) if !v.is_empty() && v != "false")
}
