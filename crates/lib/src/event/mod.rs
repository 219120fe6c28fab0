//! Build event dispatch.
//!
//! The [`EventBus`] fans out [`BuildEvent`]s to registered [`BuildListener`]s
//! synchronously, on the calling thread, in registration order. Events borrow
//! from the model and are only valid for the duration of the dispatch; a
//! listener that wants to keep anything must copy it.

pub mod recorder;

use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::model::{Target, TaskDescriptor};

/// Priority of a build message, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
  Error,
  Warn,
  Info,
  Verbose,
  Debug,
}

impl fmt::Display for MessageLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      MessageLevel::Error => "error",
      MessageLevel::Warn => "warn",
      MessageLevel::Info => "info",
      MessageLevel::Verbose => "verbose",
      MessageLevel::Debug => "debug",
    };
    f.write_str(name)
  }
}

impl std::str::FromStr for MessageLevel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "error" => Ok(MessageLevel::Error),
      "warn" | "warning" => Ok(MessageLevel::Warn),
      "info" => Ok(MessageLevel::Info),
      "verbose" => Ok(MessageLevel::Verbose),
      "debug" => Ok(MessageLevel::Debug),
      other => Err(format!("unknown message level: {other}")),
    }
  }
}

/// Where a [`BuildEvent::Message`] came from.
#[derive(Debug, Clone, Copy)]
pub enum MessageSource<'a> {
  Project,
  Target(&'a str),
  Task {
    task: &'a TaskDescriptor,
    /// Name to show in logs; the task's display name or its tag.
    label: &'a str,
  },
}

/// The failure attached to a finished event, if any.
pub type Cause<'a> = Option<&'a (dyn StdError + Send + Sync + 'static)>;

/// An event emitted during a build.
#[derive(Debug, Clone, Copy)]
pub enum BuildEvent<'a> {
  BuildStarted,
  BuildFinished { cause: Cause<'a> },
  TargetStarted { target: &'a Target },
  TargetFinished { target: &'a Target, cause: Cause<'a> },
  TaskStarted { task: &'a TaskDescriptor },
  TaskFinished { task: &'a TaskDescriptor, cause: Cause<'a> },
  Message {
    source: MessageSource<'a>,
    level: MessageLevel,
    text: &'a str,
  },
}

impl BuildEvent<'_> {
  /// Short event name, used in logs.
  pub fn kind(&self) -> &'static str {
    match self {
      BuildEvent::BuildStarted => "build_started",
      BuildEvent::BuildFinished { .. } => "build_finished",
      BuildEvent::TargetStarted { .. } => "target_started",
      BuildEvent::TargetFinished { .. } => "target_finished",
      BuildEvent::TaskStarted { .. } => "task_started",
      BuildEvent::TaskFinished { .. } => "task_finished",
      BuildEvent::Message { .. } => "message",
    }
  }
}

/// Error reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
  pub message: String,
}

impl ListenerError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// One or more listeners failed while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} build listener(s) failed: {}", failures.len(), join(failures))]
pub struct PublishError {
  pub failures: Vec<ListenerError>,
}

fn join(failures: &[ListenerError]) -> String {
  failures.iter().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; ")
}

/// Receives build events.
pub trait BuildListener: Send + Sync {
  fn on_event(&self, event: &BuildEvent<'_>) -> Result<(), ListenerError>;
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Registered = (ListenerId, Arc<dyn BuildListener>);

/// Ordered set of listeners.
#[derive(Default)]
pub struct EventBus {
  listeners: RwLock<Vec<Registered>>,
  next_id: AtomicU64,
}

impl fmt::Debug for EventBus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventBus").field("listeners", &self.listener_count()).finish()
  }
}

impl EventBus {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a listener at the end of the dispatch order.
  pub fn subscribe(&self, listener: Arc<dyn BuildListener>) -> ListenerId {
    let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
    self.write().push((id, listener));
    id
  }

  /// Remove a listener. Returns false if it was not registered.
  pub fn unsubscribe(&self, id: ListenerId) -> bool {
    let mut listeners = self.write();
    let before = listeners.len();
    listeners.retain(|(registered, _)| *registered != id);
    listeners.len() != before
  }

  pub fn listener_count(&self) -> usize {
    self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Deliver `event` to every listener.
  ///
  /// The listener set is captured before dispatch starts, so listeners may
  /// subscribe or unsubscribe from inside `on_event`. Every listener runs even
  /// if an earlier one fails.
  pub fn publish(&self, event: &BuildEvent<'_>) -> Result<(), PublishError> {
    let snapshot: Vec<Arc<dyn BuildListener>> = self
      .listeners
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .map(|(_, listener)| Arc::clone(listener))
      .collect();

    let failures: Vec<ListenerError> = snapshot
      .iter()
      .filter_map(|listener| listener.on_event(event).err())
      .collect();

    if failures.is_empty() {
      Ok(())
    } else {
      debug!(event = event.kind(), failures = failures.len(), "build listeners failed");
      Err(PublishError { failures })
    }
  }

  /// Publish a message event and mirror it to `tracing`.
  pub fn message(&self, source: MessageSource<'_>, level: MessageLevel, text: &str) -> Result<(), PublishError> {
    trace_message(level, text);
    self.publish(&BuildEvent::Message { source, level, text })
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Registered>> {
    self.listeners.write().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Forward a build message to `tracing` at the matching level.
pub fn trace_message(level: MessageLevel, text: &str) {
  match level {
    MessageLevel::Error => error!("{text}"),
    MessageLevel::Warn => warn!("{text}"),
    MessageLevel::Info => info!("{text}"),
    MessageLevel::Verbose => debug!("{text}"),
    MessageLevel::Debug => trace!("{text}"),
  }
}
