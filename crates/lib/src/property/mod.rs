//! Property storage, scoping and reference expansion.
//!
//! A [`PropertyStore`] holds three tables:
//! - ordinary properties, overwritable by any `set`
//! - user properties, which non-user writes can never change
//! - inherited properties, the subset of user properties passed down from a
//!   parent build
//!
//! On top of the tables, every thread has its own stack of local scopes (see
//! [`LocalStack`]). Lookups consult the calling thread's locals first, then the
//! registered [`PropertyHook`]s, then the tables.

pub mod expand;
pub mod hook;
pub mod local;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::thread::{self, ThreadId};

use thiserror::Error;
use tracing::{trace, warn};

use crate::event::{EventBus, MessageLevel, MessageSource};

pub use expand::PropertySource;
pub use hook::{EnvironmentHook, PropertyHook, SetKind};
pub use local::LocalStack;

/// Errors raised by property expansion and local scoping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
  /// A `${` without a matching `}`.
  #[error("syntax error in property reference: {text}")]
  MalformedReference { text: String },

  /// The same local name was bound twice in one scope.
  #[error("local property \"{name}\" is already defined in this scope")]
  DuplicateLocal { name: String },
}

#[derive(Debug, Default)]
struct Tables {
  properties: HashMap<String, String>,
  user: HashMap<String, String>,
  inherited: HashMap<String, String>,
}

type Notes = Vec<(MessageLevel, String)>;

/// The property namespace of a project.
#[derive(Default)]
pub struct PropertyStore {
  tables: Mutex<Tables>,
  locals: Mutex<HashMap<ThreadId, LocalStack>>,
  hooks: RwLock<Vec<Arc<dyn PropertyHook>>>,
  bus: Option<Arc<EventBus>>,
}

impl fmt::Debug for PropertyStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let tables = self.tables();
    f.debug_struct("PropertyStore")
      .field("properties", &tables.properties.len())
      .field("user", &tables.user.len())
      .field("inherited", &tables.inherited.len())
      .field("hooks", &self.hooks().len())
      .finish()
  }
}

impl PropertyStore {
  /// Create a store that reports diagnostics only through `tracing`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that reports diagnostics as build messages on `bus`.
  pub fn with_bus(bus: Arc<EventBus>) -> Self {
    Self {
      bus: Some(bus),
      ..Self::default()
    }
  }

  /// Append a hook to the resolution chain.
  pub fn add_hook(&self, hook: Arc<dyn PropertyHook>) {
    self.hooks.write().unwrap_or_else(PoisonError::into_inner).push(hook);
  }

  // ---------------------------------------------------------------------------
  // Reads
  // ---------------------------------------------------------------------------

  /// Look up a property.
  ///
  /// A local binding on the calling thread wins, even when it has no value.
  pub fn get(&self, name: &str) -> Option<String> {
    if let Some(local) = self.local_binding(name) {
      return local;
    }
    if let Some(value) = self.ask_hooks(name, false) {
      return Some(value);
    }
    self.tables().properties.get(name).cloned()
  }

  /// Look up a user property.
  pub fn get_user(&self, name: &str) -> Option<String> {
    if let Some(local) = self.local_binding(name) {
      return local;
    }
    if let Some(value) = self.ask_hooks(name, true) {
      return Some(value);
    }
    self.tables().user.get(name).cloned()
  }

  /// Whether `name` currently resolves to a value.
  pub fn is_set(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  /// Whether `name` is a user property.
  pub fn is_user(&self, name: &str) -> bool {
    self.tables().user.contains_key(name)
  }

  /// Expand `${}` references in `text` against this store.
  pub fn expand(&self, text: &str) -> Result<String, PropertyError> {
    expand::expand(text, self)
  }

  // ---------------------------------------------------------------------------
  // Writes
  // ---------------------------------------------------------------------------

  /// Set a property, logging overrides at verbose level.
  ///
  /// Returns false, without changing anything, if `name` is a user property.
  pub fn set(&self, name: &str, value: impl Into<String>) -> bool {
    let value = value.into();
    let mut notes = Notes::new();

    let stored = {
      let mut tables = self.tables();
      if tables.user.contains_key(name) {
        notes.push((
          MessageLevel::Verbose,
          format!("Override ignored for user property \"{name}\""),
        ));
        false
      } else if self.offer_write(name, &value, SetKind::Normal) || self.assign_local(name, &value) {
        true
      } else {
        if tables.properties.contains_key(name) {
          notes.push((
            MessageLevel::Verbose,
            format!("Overriding previous definition of property \"{name}\""),
          ));
        }
        notes.push((MessageLevel::Debug, format!("Setting project property: {name} -> {value}")));
        tables.properties.insert(name.to_string(), value);
        true
      }
    };

    self.emit(notes);
    stored
  }

  /// Set a property only if it has no value yet.
  ///
  /// A local binding without a value counts as absent. Returns true if the
  /// value was stored.
  pub fn set_if_absent(&self, name: &str, value: impl Into<String>) -> bool {
    let value = value.into();
    let local = self.local_binding(name);
    let mut notes = Notes::new();

    let stored = {
      let mut tables = self.tables();
      let has_local = local.is_some();
      let local_valued = matches!(local, Some(Some(_)));

      if (tables.properties.contains_key(name) && !has_local) || local_valued {
        notes.push((MessageLevel::Verbose, format!("Override ignored for property \"{name}\"")));
        false
      } else if self.offer_write(name, &value, SetKind::New) || self.assign_local(name, &value) {
        true
      } else {
        notes.push((MessageLevel::Debug, format!("Setting project property: {name} -> {value}")));
        tables.properties.insert(name.to_string(), value);
        true
      }
    };

    self.emit(notes);
    stored
  }

  /// Set a user property. Any previous value is replaced.
  pub fn set_user(&self, name: &str, value: impl Into<String>) {
    let value = value.into();
    let note = format!("Setting ro project property: {name} -> {value}");
    {
      let mut tables = self.tables();
      tables.user.insert(name.to_string(), value.clone());
      if !self.offer_write(name, &value, SetKind::User) {
        tables.properties.insert(name.to_string(), value);
      }
    }
    self.log(MessageLevel::Debug, &note);
  }

  /// Set a user property that was handed down from a parent build.
  pub fn set_inherited(&self, name: &str, value: impl Into<String>) {
    let value = value.into();
    let note = format!("Setting ro project property: {name} -> {value}");
    {
      let mut tables = self.tables();
      tables.inherited.insert(name.to_string(), value.clone());
      tables.user.insert(name.to_string(), value.clone());
      if !self.offer_write(name, &value, SetKind::Inherited) {
        tables.properties.insert(name.to_string(), value);
      }
    }
    self.log(MessageLevel::Debug, &note);
  }

  // ---------------------------------------------------------------------------
  // Local scopes
  // ---------------------------------------------------------------------------

  /// Enter a local scope on the calling thread.
  ///
  /// Prefer [`scope`](Self::scope), which exits on every path.
  pub fn enter_scope(&self) {
    self.locals().entry(thread::current().id()).or_default().enter();
  }

  /// Exit the innermost local scope of the calling thread.
  ///
  /// Returns false if the thread had no scope entered.
  pub fn exit_scope(&self) -> bool {
    let id = thread::current().id();
    let mut locals = self.locals();
    let Some(stack) = locals.get_mut(&id) else {
      return false;
    };
    let exited = stack.exit();
    if stack.is_empty() {
      locals.remove(&id);
    }
    exited
  }

  /// Enter a local scope that is exited when the guard drops.
  pub fn scope(&self) -> ScopeGuard<'_> {
    self.enter_scope();
    ScopeGuard { store: self }
  }

  /// Bind a local property in the calling thread's innermost scope.
  ///
  /// With no scope entered the binding is dropped.
  pub fn add_local(&self, name: &str, value: Option<String>) -> Result<(), PropertyError> {
    let mut locals = self.locals();
    let added = match locals.get_mut(&thread::current().id()) {
      Some(stack) => stack.add(name, value)?,
      None => false,
    };
    if !added {
      trace!(property = name, "no local scope entered, local binding dropped");
    }
    Ok(())
  }

  /// Snapshot the calling thread's local stack for a worker thread.
  pub fn branch(&self) -> LocalStack {
    self.locals().get(&thread::current().id()).cloned().unwrap_or_default()
  }

  /// Install `stack` as the calling thread's local stack until the guard
  /// drops.
  pub fn adopt(&self, stack: LocalStack) -> AdoptGuard<'_> {
    let id = thread::current().id();
    let previous = self.locals().insert(id, stack);
    AdoptGuard {
      store: self,
      id,
      previous,
    }
  }

  // ---------------------------------------------------------------------------
  // Snapshots and propagation
  // ---------------------------------------------------------------------------

  /// All properties visible to the calling thread, locals applied on top.
  pub fn properties(&self) -> HashMap<String, String> {
    let mut merged = self.tables().properties.clone();
    for (name, value) in self.local_properties() {
      match value {
        Some(value) => {
          merged.insert(name, value);
        }
        None => {
          merged.remove(&name);
        }
      }
    }
    merged
  }

  /// A copy of the user property table.
  pub fn user_properties(&self) -> HashMap<String, String> {
    self.tables().user.clone()
  }

  /// A copy of the inherited property table.
  pub fn inherited_properties(&self) -> HashMap<String, String> {
    self.tables().inherited.clone()
  }

  /// Local bindings visible to the calling thread.
  pub fn local_properties(&self) -> HashMap<String, Option<String>> {
    self
      .locals()
      .get(&thread::current().id())
      .map(LocalStack::visible)
      .unwrap_or_default()
  }

  /// Copy user properties that were set directly (not inherited) to `other`.
  ///
  /// Names that are already user properties of `other` are left alone.
  pub fn copy_user_properties_to(&self, other: &PropertyStore) {
    let entries: Vec<(String, String)> = {
      let tables = self.tables();
      tables
        .user
        .iter()
        .filter(|(name, _)| !tables.inherited.contains_key(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
    };
    for (name, value) in entries {
      if other.is_user(&name) {
        continue;
      }
      other.set_user(&name, value);
    }
  }

  /// Copy inherited properties to `other` as inherited properties.
  ///
  /// Names that are already user properties of `other` are left alone.
  pub fn copy_inherited_properties_to(&self, other: &PropertyStore) {
    for (name, value) in self.inherited_properties() {
      if other.is_user(&name) {
        continue;
      }
      other.set_inherited(&name, value);
    }
  }

  // ---------------------------------------------------------------------------
  // Internals
  // ---------------------------------------------------------------------------

  fn tables(&self) -> MutexGuard<'_, Tables> {
    self.tables.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn locals(&self) -> MutexGuard<'_, HashMap<ThreadId, LocalStack>> {
    self.locals.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn hooks(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn PropertyHook>>> {
    self.hooks.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn local_binding(&self, name: &str) -> Option<Option<String>> {
    self
      .locals()
      .get(&thread::current().id())
      .and_then(|stack| stack.lookup(name).cloned())
  }

  fn assign_local(&self, name: &str, value: &str) -> bool {
    self
      .locals()
      .get_mut(&thread::current().id())
      .is_some_and(|stack| stack.assign(name, value))
  }

  fn ask_hooks(&self, name: &str, user: bool) -> Option<String> {
    self.hooks().iter().find_map(|hook| hook.get(name, user))
  }

  fn offer_write(&self, name: &str, value: &str, kind: SetKind) -> bool {
    self.hooks().iter().any(|hook| hook.set(name, value, kind))
  }

  fn emit(&self, notes: Notes) {
    for (level, text) in notes {
      self.log(level, &text);
    }
  }

  fn log(&self, level: MessageLevel, text: &str) {
    match &self.bus {
      Some(bus) => {
        if let Err(e) = bus.message(MessageSource::Project, level, text) {
          warn!(error = %e, "build listener failed while logging a property message");
        }
      }
      None => crate::event::trace_message(level, text),
    }
  }
}

impl PropertySource for PropertyStore {
  fn property(&self, name: &str) -> Option<String> {
    self.get(name)
  }

  fn unresolved(&self, name: &str) {
    self.log(MessageLevel::Verbose, &format!("Property \"{name}\" has not been set"));
  }
}

/// Exits a local scope when dropped.
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
  store: &'a PropertyStore,
}

impl Drop for ScopeGuard<'_> {
  fn drop(&mut self) {
    self.store.exit_scope();
  }
}

/// Restores a thread's previous local stack when dropped.
#[must_use = "the adopted stack is discarded as soon as the guard is dropped"]
pub struct AdoptGuard<'a> {
  store: &'a PropertyStore,
  id: ThreadId,
  previous: Option<LocalStack>,
}

impl Drop for AdoptGuard<'_> {
  fn drop(&mut self) {
    let mut locals = self.store.locals();
    match self.previous.take() {
      Some(stack) => {
        locals.insert(self.id, stack);
      }
      None => {
        locals.remove(&self.id);
      }
    }
  }
}
