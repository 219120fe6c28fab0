use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{Task, TaskFactory, TaskSchema, builtin};

/// A factory backed by a closure.
pub struct FnFactory<F> {
  schema: TaskSchema,
  create: F,
}

impl<F> FnFactory<F>
where
  F: Fn() -> Box<dyn Task> + Send + Sync,
{
  pub fn new(schema: TaskSchema, create: F) -> Self {
    Self { schema, create }
  }
}

impl<F> TaskFactory for FnFactory<F>
where
  F: Fn() -> Box<dyn Task> + Send + Sync,
{
  fn schema(&self) -> &TaskSchema {
    &self.schema
  }

  fn create(&self) -> Box<dyn Task> {
    (self.create)()
  }
}

/// Maps element names to task factories.
#[derive(Clone, Default)]
pub struct TaskRegistry {
  factories: BTreeMap<String, Arc<dyn TaskFactory>>,
}

impl fmt::Debug for TaskRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskRegistry")
      .field("tasks", &self.factories.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl TaskRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with the built-in tasks registered.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    builtin::register_all(&mut registry);
    registry
  }

  /// Register a task under its schema name, replacing any previous
  /// registration.
  pub fn register<F>(&mut self, schema: TaskSchema, create: F)
  where
    F: Fn() -> Box<dyn Task> + Send + Sync + 'static,
  {
    self.register_factory(Arc::new(FnFactory::new(schema, create)));
  }

  pub fn register_factory(&mut self, factory: Arc<dyn TaskFactory>) {
    let name = factory.schema().name().to_string();
    if self.factories.insert(name.clone(), factory).is_some() {
      debug!(task = %name, "task definition replaced");
    }
  }

  pub fn get(&self, name: &str) -> Option<&dyn TaskFactory> {
    self.factories.get(name).map(|factory| factory.as_ref())
  }

  pub fn schema(&self, name: &str) -> Option<&TaskSchema> {
    self.get(name).map(|factory| factory.schema())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.contains_key(name)
  }

  /// Registered task names, sorted.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.factories.keys().map(String::as_str)
  }
}
