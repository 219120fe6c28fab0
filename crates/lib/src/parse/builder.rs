//! Streaming construction of the project model.
//!
//! The builder keeps one stack of [`State`]s mirroring the open elements and
//! dispatches each event on the state at the top. Targets are registered as
//! soon as their start tag is seen; tasks are attached to them when their end
//! tag closes. Imports are collected and handed back to the parser once the
//! document is complete, so targets of the importing document always claim
//! their names first.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::source::EventSink;
use super::ParseError;
use crate::consts::{BASEDIR_PROPERTY, PROJECT_FILE_PREFIX};
use crate::event::MessageLevel;
use crate::model::{Location, Project, Reference, Target, TaskDescriptor};
use crate::util::{parse_bool, resolve_against};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// Before the document element.
  Root,
  Project,
  Target,
  /// A task or data element, at any depth.
  Element,
  Import,
  /// The project `description` element.
  Description,
  /// Markup nested inside a `description`.
  Ignored,
}

/// Where finished top-level elements go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Owner {
  Implicit,
  Target(String),
  /// The enclosing target lost a name collision; its tasks are dropped.
  Discarded,
}

/// An `<import>` seen in the document, processed after the document ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingImport {
  pub file: String,
  pub optional: bool,
  pub location: Location,
}

pub(crate) struct ModelBuilder<'p> {
  project: &'p mut Project,
  file: Option<PathBuf>,
  imported: bool,
  states: Vec<State>,
  elements: Vec<TaskDescriptor>,
  owner: Owner,
  /// Name of the project element of this document, if any.
  project_name: Option<String>,
  description: Option<String>,
  imports: Vec<PendingImport>,
}

fn malformed(message: impl Into<String>, location: &Location) -> ParseError {
  ParseError::MalformedModel {
    message: message.into(),
    location: location.clone(),
  }
}

impl<'p> ModelBuilder<'p> {
  pub fn new(project: &'p mut Project, file: Option<&Path>, imported: bool) -> Self {
    Self {
      project,
      file: file.map(Path::to_path_buf),
      imported,
      states: vec![State::Root],
      elements: Vec::new(),
      owner: Owner::Implicit,
      project_name: None,
      description: None,
      imports: Vec::new(),
    }
  }

  /// Check the document was complete and return its imports.
  pub fn finish(self) -> Result<Vec<PendingImport>, ParseError> {
    if self.states != [State::Root] {
      let location = Location::new(self.file.clone(), 0, 0);
      return Err(malformed("unexpected end of document", &location));
    }
    if let Some(description) = self.description
      && !self.imported
      && self.project.description().is_none()
    {
      self.project.set_description(description.trim());
    }
    Ok(self.imports)
  }

  fn document_dir(&self) -> PathBuf {
    match self.file.as_deref().and_then(Path::parent) {
      Some(dir) => dir.to_path_buf(),
      None => self.project.base_dir().to_path_buf(),
    }
  }

  fn state(&self) -> State {
    self.states.last().copied().unwrap_or(State::Root)
  }

  // ---------------------------------------------------------------------------
  // project
  // ---------------------------------------------------------------------------

  fn start_project(&mut self, attributes: &[(String, String)], location: &Location) -> Result<(), ParseError> {
    let mut default = None;
    let mut name = None;
    let mut id = None;
    let mut basedir = None;
    let mut description = None;

    for (key, value) in attributes {
      match key.as_str() {
        "default" => default = Some(value.clone()).filter(|v| !v.is_empty()),
        "name" => name = Some(value.clone()),
        "id" => id = Some(value.clone()),
        "basedir" => basedir = Some(value.clone()),
        "description" => description = Some(value.clone()),
        _ => return Err(malformed(format!("Unexpected attribute \"{key}\""), location)),
      }
    }

    self.project_name = name.clone();

    if let Some(name) = &name {
      let property = format!("{PROJECT_FILE_PREFIX}{name}");
      let properties = self.project.properties();
      if self.imported
        && let Some(previous) = properties.get(&property)
        && let Some(file) = &self.file
        && Path::new(&previous) != file.as_path()
      {
        self.project.log(
          MessageLevel::Warn,
          &format!(
            "Duplicated project name in import. Project {name} defined first in {previous} and again in {}",
            file.display()
          ),
        )?;
      }
      if let Some(file) = &self.file {
        self.project.properties().set_user(&property, file.display().to_string());
      }
    }

    if self.imported {
      debug!(project = ?name, "imported project element, attributes not applied");
      return Ok(());
    }

    if let Some(name) = name {
      self.project.set_name(name.clone());
      self.project.add_reference(name, Reference::Project)?;
    }
    if let Some(id) = id {
      self.project.add_reference(id, Reference::Project)?;
    }
    if let Some(description) = description {
      self.project.set_description(description);
    }
    if let Some(default) = default {
      self.project.set_default_target(default);
    }

    let base_dir = match (self.project.properties().get(BASEDIR_PROPERTY), basedir) {
      (Some(preset), _) => PathBuf::from(preset),
      (None, None) => self.document_dir(),
      (None, Some(dir)) => resolve_against(&self.document_dir(), dir),
    };
    self.project.set_base_dir(base_dir);

    Ok(())
  }

  // ---------------------------------------------------------------------------
  // target
  // ---------------------------------------------------------------------------

  fn start_target(&mut self, attributes: &[(String, String)], location: &Location) -> Result<(), ParseError> {
    let mut target = Target {
      location: location.clone(),
      ..Target::default()
    };
    let mut name = None;
    let mut id = None;

    for (key, value) in attributes {
      match key.as_str() {
        "name" => {
          if value.is_empty() {
            return Err(malformed("name attribute must not be empty", location));
          }
          name = Some(value.clone());
        }
        "depends" => {
          target.depends = Target::parse_depends(value).map_err(|message| malformed(message, location))?;
        }
        "if" => target.if_condition = Some(value.clone()),
        "unless" => target.unless_condition = Some(value.clone()),
        "id" => id = Some(value.clone()).filter(|v| !v.is_empty()),
        "description" => target.description = Some(value.clone()),
        _ => return Err(malformed(format!("Unexpected attribute \"{key}\""), location)),
      }
    }

    let Some(name) = name else {
      return Err(malformed("target element appears without a name attribute", location));
    };
    target.name = name;

    let registered = self.project.add_target(target, self.project_name.as_deref())?;
    if let (Some(id), Some(registered)) = (id, &registered) {
      self.project.add_reference(id, Reference::Target(registered.clone()))?;
    }

    self.owner = match registered {
      Some(name) => Owner::Target(name),
      None => Owner::Discarded,
    };
    Ok(())
  }

  // ---------------------------------------------------------------------------
  // import
  // ---------------------------------------------------------------------------

  fn start_import(&mut self, attributes: &[(String, String)], location: &Location) -> Result<(), ParseError> {
    let mut file = None;
    let mut optional = false;

    for (key, value) in attributes {
      match key.as_str() {
        "file" => file = Some(value.clone()),
        "optional" => {
          optional = parse_bool(value)
            .ok_or_else(|| malformed(format!("Invalid boolean \"{value}\" for attribute optional"), location))?;
        }
        _ => return Err(malformed(format!("Unexpected attribute \"{key}\""), location)),
      }
    }

    let Some(file) = file.filter(|f| !f.is_empty()) else {
      return Err(malformed("import requires file attribute", location));
    };

    trace!(file = %file, optional, "import queued");
    self.imports.push(PendingImport {
      file,
      optional,
      location: location.clone(),
    });
    Ok(())
  }

  // ---------------------------------------------------------------------------
  // elements
  // ---------------------------------------------------------------------------

  fn start_descriptor(&mut self, name: &str, attributes: &[(String, String)], location: Location) {
    let mut descriptor = TaskDescriptor::new(name, location);
    for (key, value) in attributes {
      if key == "id" {
        descriptor.id = Some(value.clone()).filter(|v| !v.is_empty());
      } else {
        descriptor.attributes.push((key.clone(), value.clone()));
      }
    }
    self.elements.push(descriptor);
  }

  fn end_descriptor(&mut self, name: &str, location: &Location) -> Result<(), ParseError> {
    let Some(descriptor) = self.elements.pop() else {
      return Err(malformed(format!("Unexpected end tag \"{name}\""), location));
    };
    if descriptor.name != name {
      return Err(malformed(
        format!("Unexpected end tag \"{name}\", expected \"{}\"", descriptor.name),
        location,
      ));
    }

    if let Some(id) = &descriptor.id {
      self.project.add_reference(id.clone(), Reference::Element(descriptor.clone()))?;
    }

    if let Some(parent) = self.elements.last_mut() {
      let singular = self
        .project
        .registry()
        .schema(&parent.name)
        .is_some_and(|schema| schema.is_singular(&descriptor.name));
      if singular && parent.children.iter().any(|child| child.name == descriptor.name) {
        return Err(malformed(
          format!(
            "{} accepts only one nested \"{}\" element",
            parent.name, descriptor.name
          ),
          &descriptor.location,
        ));
      }
      parent.children.push(descriptor);
      return Ok(());
    }

    match &self.owner {
      Owner::Implicit => {
        self.project.add_task_to("", descriptor);
      }
      Owner::Target(target) => {
        self.project.add_task_to(target, descriptor);
      }
      Owner::Discarded => {
        trace!(task = %descriptor.name, "dropping task of discarded target");
      }
    }
    Ok(())
  }

  fn expect_end(&self, expected: &str, name: &str, location: &Location) -> Result<(), ParseError> {
    if name == expected {
      Ok(())
    } else {
      Err(malformed(
        format!("Unexpected end tag \"{name}\", expected \"{expected}\""),
        location,
      ))
    }
  }
}

impl EventSink for ModelBuilder<'_> {
  fn start_element(
    &mut self,
    name: &str,
    attributes: &[(String, String)],
    location: Location,
  ) -> Result<(), ParseError> {
    let unexpected = |location: Location| ParseError::UnexpectedElement {
      element: name.to_string(),
      location,
    };

    let next = match self.state() {
      State::Root => {
        if name != "project" {
          return Err(unexpected(location));
        }
        self.start_project(attributes, &location)?;
        State::Project
      }
      State::Project => match name {
        "target" => {
          self.start_target(attributes, &location)?;
          State::Target
        }
        "import" => {
          self.start_import(attributes, &location)?;
          State::Import
        }
        "description" if attributes.is_empty() => State::Description,
        _ => {
          self.start_descriptor(name, attributes, location);
          State::Element
        }
      },
      State::Target => match name {
        "target" | "import" => return Err(unexpected(location)),
        _ => {
          self.start_descriptor(name, attributes, location);
          State::Element
        }
      },
      State::Element => {
        self.start_descriptor(name, attributes, location);
        State::Element
      }
      State::Import => return Err(unexpected(location)),
      State::Description | State::Ignored => State::Ignored,
    };

    self.states.push(next);
    Ok(())
  }

  fn characters(&mut self, text: &str, location: Location) -> Result<(), ParseError> {
    match self.state() {
      State::Element => {
        if let Some(element) = self.elements.last_mut() {
          element.append_text(text);
        }
        Ok(())
      }
      State::Description => {
        self.description.get_or_insert_with(String::new).push_str(text);
        Ok(())
      }
      State::Ignored => Ok(()),
      _ if text.trim().is_empty() => Ok(()),
      _ => Err(malformed(format!("Unexpected text \"{}\"", text.trim()), &location)),
    }
  }

  fn end_element(&mut self, name: &str, location: Location) -> Result<(), ParseError> {
    let Some(state) = self.states.pop() else {
      return Err(malformed(format!("Unexpected end tag \"{name}\""), &location));
    };

    match state {
      State::Root => Err(malformed(format!("Unexpected end tag \"{name}\""), &location)),
      State::Project => self.expect_end("project", name, &location),
      State::Target => {
        self.expect_end("target", name, &location)?;
        self.owner = Owner::Implicit;
        Ok(())
      }
      State::Import => self.expect_end("import", name, &location),
      State::Description => self.expect_end("description", name, &location),
      State::Element => self.end_descriptor(name, &location),
      State::Ignored => Ok(()),
    }
  }
}
