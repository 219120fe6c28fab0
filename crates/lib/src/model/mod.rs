//! The project model: targets, references, properties and services.
//!
//! A [`Project`] owns everything a build needs:
//! - the targets built from the build file
//! - the implicit target holding tasks declared directly under `project`
//! - the [`PropertyStore`]
//! - the [`EventBus`] listeners are attached to
//! - the [`TaskRegistry`] used to instantiate tasks

mod location;
mod target;
mod task;

pub use location::Location;
pub use target::Target;
pub use task::TaskDescriptor;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::consts::{BASEDIR_PROPERTY, IMPLICIT_TARGET};
use crate::event::{EventBus, MessageLevel, MessageSource, PublishError};
use crate::graph::{GraphError, TargetGraph};
use crate::property::PropertyStore;
use crate::task::TaskRegistry;
use crate::util::resolve_against;

/// Something registered under an `id`.
#[derive(Clone)]
pub enum Reference {
  /// The project itself.
  Project,
  /// A target, by name.
  Target(String),
  /// An unconfigured element.
  Element(TaskDescriptor),
  /// A plain string value.
  Text(String),
  /// An arbitrary object registered by an embedder or a task.
  Object(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Reference::Project => f.write_str("Project"),
      Reference::Target(name) => f.debug_tuple("Target").field(name).finish(),
      Reference::Element(task) => f.debug_tuple("Element").field(&task.name).finish(),
      Reference::Text(text) => f.debug_tuple("Text").field(text).finish(),
      Reference::Object(_) => f.write_str("Object(..)"),
    }
  }
}

/// Target listing used by `-projecthelp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
  pub name: Option<String>,
  pub description: Option<String>,
  pub default_target: Option<String>,
  pub base_dir: PathBuf,
  pub targets: Vec<TargetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
  pub name: String,
  pub description: Option<String>,
  pub depends: Vec<String>,
}

/// A build project.
pub struct Project {
  name: Option<String>,
  description: Option<String>,
  base_dir: PathBuf,
  default_target: Option<String>,
  targets: BTreeMap<String, Target>,
  implicit_target: Target,
  references: HashMap<String, Reference>,
  properties: PropertyStore,
  bus: Arc<EventBus>,
  registry: TaskRegistry,
}

impl fmt::Debug for Project {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Project")
      .field("name", &self.name)
      .field("base_dir", &self.base_dir)
      .field("default_target", &self.default_target)
      .field("targets", &self.targets.keys().collect::<Vec<_>>())
      .finish_non_exhaustive()
  }
}

impl Default for Project {
  fn default() -> Self {
    Self::new()
  }
}

impl Project {
  /// Create an empty project with the built-in tasks registered.
  pub fn new() -> Self {
    Self::with_registry(TaskRegistry::with_builtins())
  }

  /// Create an empty project using `registry` for task lookup.
  pub fn with_registry(registry: TaskRegistry) -> Self {
    let bus = Arc::new(EventBus::new());
    Self {
      name: None,
      description: None,
      base_dir: PathBuf::from("."),
      default_target: None,
      targets: BTreeMap::new(),
      implicit_target: Target::new(IMPLICIT_TARGET),
      references: HashMap::new(),
      properties: PropertyStore::with_bus(Arc::clone(&bus)),
      bus,
      registry,
    }
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn set_name(&mut self, name: impl Into<String>) {
    self.name = Some(name.into());
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn set_description(&mut self, description: impl Into<String>) {
    self.description = Some(description.into());
  }

  pub fn default_target(&self) -> Option<&str> {
    self.default_target.as_deref()
  }

  pub fn set_default_target(&mut self, target: impl Into<String>) {
    self.default_target = Some(target.into());
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  /// Set the base directory and the `basedir` user property.
  pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
    let dir = dir.into();
    let dir = dunce::canonicalize(&dir).unwrap_or(dir);
    self.properties.set_user(BASEDIR_PROPERTY, dir.display().to_string());
    debug!(base_dir = %dir.display(), "project base directory set");
    self.base_dir = dir;
  }

  /// Resolve a path relative to the base directory.
  pub fn resolve_file(&self, path: impl AsRef<Path>) -> PathBuf {
    resolve_against(&self.base_dir, path)
  }

  pub fn properties(&self) -> &PropertyStore {
    &self.properties
  }

  pub fn bus(&self) -> &Arc<EventBus> {
    &self.bus
  }

  pub fn registry(&self) -> &TaskRegistry {
    &self.registry
  }

  pub fn registry_mut(&mut self) -> &mut TaskRegistry {
    &mut self.registry
  }

  // ---------------------------------------------------------------------------
  // Targets
  // ---------------------------------------------------------------------------

  pub fn targets(&self) -> &BTreeMap<String, Target> {
    &self.targets
  }

  pub fn target(&self, name: &str) -> Option<&Target> {
    self.targets.get(name)
  }

  pub fn implicit_target(&self) -> &Target {
    &self.implicit_target
  }

  pub fn implicit_target_mut(&mut self) -> &mut Target {
    &mut self.implicit_target
  }

  /// Register a target, applying the collision policy.
  ///
  /// When the name is taken, the target is renamed to `<namespace>.<name>`
  /// if a namespace (the name of the project being read) is known and that
  /// name is free; otherwise it is discarded with a warning. Returns the name
  /// the target was registered under.
  pub fn add_target(&mut self, mut target: Target, namespace: Option<&str>) -> Result<Option<String>, PublishError> {
    let original = target.name.clone();
    if !self.targets.contains_key(&original) {
      self.targets.insert(original.clone(), target);
      return Ok(Some(original));
    }

    if let Some(namespace) = namespace {
      let renamed = format!("{namespace}.{original}");
      if !self.targets.contains_key(&renamed) {
        self.log(
          MessageLevel::Verbose,
          &format!("Already defined in main or a previous import, define {original} as {renamed}"),
        )?;
        target.name = renamed.clone();
        for task in &mut target.tasks {
          task.set_owning_target(&renamed);
        }
        self.targets.insert(renamed.clone(), target);
        return Ok(Some(renamed));
      }
    }

    self.log(
      MessageLevel::Warn,
      &format!("Already defined in main or a previous import, ignore {original}"),
    )?;
    Ok(None)
  }

  /// Add a task to an already registered target.
  pub fn add_task_to(&mut self, target: &str, task: TaskDescriptor) -> bool {
    if target.is_empty() {
      self.implicit_target.add_task(task);
      return true;
    }
    match self.targets.get_mut(target) {
      Some(target) => {
        target.add_task(task);
        true
      }
      None => false,
    }
  }

  /// Order in which `requested` and all their dependencies run.
  pub fn resolve_execution_order<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<&Target>, GraphError> {
    TargetGraph::new(&self.targets).execution_order(requested)
  }

  // ---------------------------------------------------------------------------
  // References
  // ---------------------------------------------------------------------------

  pub fn reference(&self, id: &str) -> Option<&Reference> {
    self.references.get(id)
  }

  pub fn references(&self) -> &HashMap<String, Reference> {
    &self.references
  }

  /// Register `reference` under `id`, replacing any previous one.
  pub fn add_reference(&mut self, id: impl Into<String>, reference: Reference) -> Result<(), PublishError> {
    let id = id.into();
    if self.references.contains_key(&id) {
      self.log(
        MessageLevel::Verbose,
        &format!("Overriding previous definition of reference to {id}"),
      )?;
    }
    self.references.insert(id, reference);
    Ok(())
  }

  // ---------------------------------------------------------------------------
  // Logging
  // ---------------------------------------------------------------------------

  /// Publish a project-level message.
  pub fn log(&self, level: MessageLevel, text: &str) -> Result<(), PublishError> {
    self.bus.message(MessageSource::Project, level, text)
  }

  pub fn summary(&self) -> ProjectSummary {
    ProjectSummary {
      name: self.name.clone(),
      description: self.description.clone(),
      default_target: self.default_target.clone(),
      base_dir: self.base_dir.clone(),
      targets: self
        .targets
        .values()
        .map(|target| TargetSummary {
          name: target.name.clone(),
          description: target.description.clone(),
          depends: target.depends.clone(),
        })
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::recorder::EventRecorder;

  fn recording_project() -> (Project, Arc<EventRecorder>) {
    let project = Project::new();
    let recorder = Arc::new(EventRecorder::new());
    project.bus().subscribe(recorder.clone());
    (project, recorder)
  }

  #[test]
  fn colliding_target_renamed_into_namespace() {
    let (mut project, recorder) = recording_project();
    project.add_target(Target::new("build"), Some("main")).unwrap();

    let registered = project
      .add_target(
        Target::new("build").with_task(TaskDescriptor::new("echo", Location::default())),
        Some("lib"),
      )
      .unwrap();

    assert_eq!(registered.as_deref(), Some("lib.build"));
    assert_eq!(project.target("lib.build").unwrap().tasks[0].owning_target, "lib.build");
    assert!(recorder.has_message(
      MessageLevel::Verbose,
      "Already defined in main or a previous import, define build as lib.build"
    ));
  }

  #[test]
  fn colliding_target_without_namespace_discarded() {
    let (mut project, recorder) = recording_project();
    project.add_target(Target::new("build").with_depends(["init"]), None).unwrap();

    let registered = project.add_target(Target::new("build"), None).unwrap();

    assert_eq!(registered, None);
    assert_eq!(project.target("build").unwrap().depends, vec!["init".to_string()]);
    assert!(recorder.has_message(
      MessageLevel::Warn,
      "Already defined in main or a previous import, ignore build"
    ));
  }

  #[test]
  fn set_base_dir_sets_user_property() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut project = Project::new();
    project.set_base_dir(temp.path());

    let expected = dunce::canonicalize(temp.path()).unwrap();
    assert_eq!(project.base_dir(), expected);
    assert_eq!(
      project.properties().get_user(BASEDIR_PROPERTY),
      Some(expected.display().to_string())
    );
    assert!(!project.properties().set(BASEDIR_PROPERTY, "/elsewhere"));
  }

  #[test]
  fn references_replace_with_notice() {
    let (mut project, recorder) = recording_project();
    project.add_reference("cp", Reference::Text("a".to_string())).unwrap();
    project.add_reference("cp", Reference::Text("b".to_string())).unwrap();

    assert!(matches!(project.reference("cp"), Some(Reference::Text(t)) if t == "b"));
    assert!(recorder.has_message(
      MessageLevel::Verbose,
      "Overriding previous definition of reference to cp"
    ));
  }

  #[test]
  fn summary_lists_targets_sorted() {
    let mut project = Project::new();
    project.set_name("demo");
    project.set_default_target("dist");
    project.add_target(Target::new("dist").with_depends(["compile"]), None).unwrap();
    project.add_target(
      Target {
        description: Some("Compile sources".to_string()),
        ..Target::new("compile")
      },
      None,
    )
    .unwrap();

    let summary = project.summary();
    let names: Vec<_> = summary.targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["compile", "dist"]);
    assert_eq!(summary.default_target.as_deref(), Some("dist"));
    assert_eq!(summary.targets[0].description.as_deref(), Some("Compile sources"));
  }
}
