//! Lazy task configuration.
//!
//! Descriptors keep their attributes raw until the task runs. At that point
//! the descriptor is validated against the task's [`TaskSchema`], its
//! attributes and text are expanded against the current properties, and a
//! fresh task instance receives the results.
//!
//! Nested elements the schema declares are expanded eagerly and handed over
//! as [`ConfiguredElement`]s. Any other child of a task container is passed
//! through unexpanded, to be configured when the container runs it.

use std::collections::HashSet;

use tracing::trace;

use crate::model::TaskDescriptor;
use crate::property::PropertyError;
use crate::property::expand::{PropertySource, expand};
use crate::task::{ConfigError, ConfiguredElement, Multiplicity, Task, TaskFactory, TaskSchema};

/// Expand a descriptor and all of its children.
pub fn configure(
  descriptor: &TaskDescriptor,
  source: &(impl PropertySource + ?Sized),
) -> Result<ConfiguredElement, PropertyError> {
  let attributes = descriptor
    .attributes
    .iter()
    .map(|(name, raw)| expand(raw, source).map(|value| (name.clone(), value)))
    .collect::<Result<Vec<_>, PropertyError>>()?;

  let text = descriptor.text.as_deref().map(|text| expand(text, source)).transpose()?;

  let children = descriptor
    .children
    .iter()
    .map(|child| configure(child, source))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(ConfiguredElement {
    name: descriptor.name.clone(),
    attributes,
    text,
    children,
    location: descriptor.location.clone(),
  })
}

/// Check a descriptor's shape against a schema without expanding anything.
pub fn validate(descriptor: &TaskDescriptor, schema: &TaskSchema) -> Result<(), ConfigError> {
  let task = &descriptor.name;

  if let Some((attribute, _)) = descriptor
    .attributes
    .iter()
    .find(|(name, _)| !schema.accepts_attribute(name))
  {
    return Err(ConfigError::UnknownAttribute {
      task: task.clone(),
      attribute: attribute.clone(),
    });
  }

  if let Some(attribute) = schema
    .required_attributes()
    .find(|name| descriptor.attribute(name).is_none())
  {
    return Err(ConfigError::MissingAttribute {
      task: task.clone(),
      attribute: attribute.to_string(),
    });
  }

  let mut singles = HashSet::new();
  for child in &descriptor.children {
    match schema.multiplicity(&child.name) {
      Some(Multiplicity::Single) => {
        if !singles.insert(child.name.as_str()) {
          return Err(ConfigError::DuplicateElement {
            task: task.clone(),
            element: child.name.clone(),
          });
        }
      }
      Some(Multiplicity::Many) => {}
      None if schema.accepts_tasks() => {}
      None => {
        return Err(ConfigError::UnknownElement {
          task: task.clone(),
          element: child.name.clone(),
        });
      }
    }
  }

  if let Some(text) = significant_text(descriptor)
    && !schema.accepts_text()
  {
    return Err(ConfigError::UnexpectedText {
      task: task.clone(),
      text: text.trim().to_string(),
    });
  }

  Ok(())
}

/// Create a task from `factory` and configure it from `descriptor`.
pub fn bind(
  descriptor: &TaskDescriptor,
  factory: &dyn TaskFactory,
  source: &(impl PropertySource + ?Sized),
) -> Result<Box<dyn Task>, ConfigError> {
  let schema = factory.schema();
  validate(descriptor, schema)?;

  let mut task = factory.create();

  for (name, raw) in &descriptor.attributes {
    let value = expand(raw, source)?;
    trace!(task = %descriptor.name, attribute = %name, value = %value, "setting attribute");
    task.set_attribute(name, &value)?;
  }

  if let Some(text) = significant_text(descriptor) {
    task.add_text(&expand(text, source)?)?;
  }

  for child in &descriptor.children {
    if schema.multiplicity(&child.name).is_some() {
      task.add_element(configure(child, source)?)?;
    } else {
      task.add_task(child.clone())?;
    }
  }

  Ok(task)
}

/// Character data that is not just whitespace.
fn significant_text(descriptor: &TaskDescriptor) -> Option<&str> {
  descriptor.text.as_deref().filter(|text| !text.trim().is_empty())
}
