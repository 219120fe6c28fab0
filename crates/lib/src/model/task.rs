use super::Location;

/// An unconfigured element as it appeared in the build file.
///
/// Attribute values are stored raw; `${}` references are expanded only when
/// the owning task is configured at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
  /// Element tag, used to look the task up in the registry.
  pub name: String,
  pub id: Option<String>,
  /// Attributes in document order.
  pub attributes: Vec<(String, String)>,
  pub children: Vec<TaskDescriptor>,
  /// Accumulated character data, if any was seen.
  pub text: Option<String>,
  /// Name of the target this element belongs to (empty for the implicit
  /// target).
  pub owning_target: String,
  pub location: Location,
}

impl TaskDescriptor {
  pub fn new(name: impl Into<String>, location: Location) -> Self {
    Self {
      name: name.into(),
      id: None,
      attributes: Vec::new(),
      children: Vec::new(),
      text: None,
      owning_target: String::new(),
      location,
    }
  }

  /// Builder-style attribute setter.
  pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.push((name.into(), value.into()));
    self
  }

  /// Builder-style child setter.
  pub fn with_child(mut self, child: TaskDescriptor) -> Self {
    self.children.push(child);
    self
  }

  /// Raw value of the first attribute called `name`.
  pub fn attribute(&self, name: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value.as_str())
  }

  /// Append character data.
  pub fn append_text(&mut self, chars: &str) {
    self.text.get_or_insert_with(String::new).push_str(chars);
  }

  /// Record the owning target on this element and every descendant.
  pub fn set_owning_target(&mut self, target: &str) {
    self.owning_target = target.to_string();
    for child in &mut self.children {
      child.set_owning_target(target);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn owning_target_reaches_descendants() {
    let line = TaskDescriptor::new("line", Location::default());
    let echo = TaskDescriptor::new("echo", Location::default()).with_child(line);
    let mut task = TaskDescriptor::new("sequential", Location::default()).with_child(echo);
    task.set_owning_target("dist");

    assert_eq!(task.owning_target, "dist");
    assert_eq!(task.children[0].children[0].owning_target, "dist");
  }

  #[test]
  fn text_accumulates() {
    let mut task = TaskDescriptor::new("echo", Location::default());
    assert_eq!(task.text, None);
    task.append_text("hello ");
    task.append_text("world");
    assert_eq!(task.text.as_deref(), Some("hello world"));
  }

  #[test]
  fn first_attribute_wins() {
    let task = TaskDescriptor::new("echo", Location::default())
      .with_attribute("message", "a")
      .with_attribute("message", "b");
    assert_eq!(task.attribute("message"), Some("a"));
    assert_eq!(task.attribute("level"), None);
  }
}
