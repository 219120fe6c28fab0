use std::collections::{BTreeMap, BTreeSet};

/// How many times a nested element may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
  Single,
  Many,
}

/// What a task type accepts when it is configured.
///
/// # Example
///
/// ```
/// use tack_lib::task::{Multiplicity, TaskSchema};
///
/// let schema = TaskSchema::new("copy")
///   .required("todir")
///   .attribute("overwrite")
///   .single_element("srcfile")
///   .element("fileset");
///
/// assert!(schema.accepts_attribute("todir"));
/// assert_eq!(schema.multiplicity("srcfile"), Some(Multiplicity::Single));
/// assert!(!schema.accepts_text());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSchema {
  name: String,
  attributes: BTreeSet<String>,
  required: BTreeSet<String>,
  elements: BTreeMap<String, Multiplicity>,
  nested_tasks: bool,
  text: bool,
}

impl TaskSchema {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  /// Accept an optional attribute.
  pub fn attribute(mut self, name: impl Into<String>) -> Self {
    self.attributes.insert(name.into());
    self
  }

  /// Accept an attribute that must be present.
  pub fn required(mut self, name: impl Into<String>) -> Self {
    let name = name.into();
    self.attributes.insert(name.clone());
    self.required.insert(name);
    self
  }

  /// Accept a nested element any number of times.
  pub fn element(mut self, name: impl Into<String>) -> Self {
    self.elements.insert(name.into(), Multiplicity::Many);
    self
  }

  /// Accept a nested element at most once.
  pub fn single_element(mut self, name: impl Into<String>) -> Self {
    self.elements.insert(name.into(), Multiplicity::Single);
    self
  }

  /// Accept nested tasks.
  pub fn nested_tasks(mut self) -> Self {
    self.nested_tasks = true;
    self
  }

  /// Accept character data.
  pub fn text(mut self) -> Self {
    self.text = true;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn accepts_attribute(&self, name: &str) -> bool {
    self.attributes.contains(name)
  }

  pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
    self.required.iter().map(String::as_str)
  }

  pub fn multiplicity(&self, name: &str) -> Option<Multiplicity> {
    self.elements.get(name).copied()
  }

  pub fn is_singular(&self, name: &str) -> bool {
    self.multiplicity(name) == Some(Multiplicity::Single)
  }

  pub fn accepts_tasks(&self) -> bool {
    self.nested_tasks
  }

  pub fn accepts_text(&self) -> bool {
    self.text
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_implies_accepted() {
    let schema = TaskSchema::new("fail").required("message");
    assert!(schema.accepts_attribute("message"));
    assert_eq!(schema.required_attributes().collect::<Vec<_>>(), ["message"]);
  }

  #[test]
  fn element_multiplicity() {
    let schema = TaskSchema::new("copy").single_element("srcfile").element("fileset");
    assert!(schema.is_singular("srcfile"));
    assert!(!schema.is_singular("fileset"));
    assert_eq!(schema.multiplicity("mapper"), None);
  }
}
