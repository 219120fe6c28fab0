//! A listener that keeps an owned copy of every event.
//!
//! Useful for tests and for embedders that want to inspect a build after the
//! fact.

use std::sync::{Mutex, PoisonError};

use super::{BuildEvent, BuildListener, Cause, ListenerError, MessageLevel, MessageSource};

/// Owned form of a [`BuildEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
  BuildStarted,
  BuildFinished { cause: Option<String> },
  TargetStarted { target: String },
  TargetFinished { target: String, cause: Option<String> },
  TaskStarted { task: String, target: String },
  TaskFinished { task: String, cause: Option<String> },
  Message { level: MessageLevel, text: String, origin: Option<String> },
}

fn cause(cause: &Cause<'_>) -> Option<String> {
  cause.map(|e| e.to_string())
}

impl RecordedEvent {
  fn capture(event: &BuildEvent<'_>) -> Self {
    match event {
      BuildEvent::BuildStarted => RecordedEvent::BuildStarted,
      BuildEvent::BuildFinished { cause: c } => RecordedEvent::BuildFinished { cause: cause(c) },
      BuildEvent::TargetStarted { target } => RecordedEvent::TargetStarted {
        target: target.name.clone(),
      },
      BuildEvent::TargetFinished { target, cause: c } => RecordedEvent::TargetFinished {
        target: target.name.clone(),
        cause: cause(c),
      },
      BuildEvent::TaskStarted { task } => RecordedEvent::TaskStarted {
        task: task.name.clone(),
        target: task.owning_target.clone(),
      },
      BuildEvent::TaskFinished { task, cause: c } => RecordedEvent::TaskFinished {
        task: task.name.clone(),
        cause: cause(c),
      },
      BuildEvent::Message { source, level, text } => RecordedEvent::Message {
        level: *level,
        text: text.to_string(),
        origin: match source {
          MessageSource::Project => None,
          MessageSource::Target(name) => Some(name.to_string()),
          MessageSource::Task { label, .. } => Some(label.to_string()),
        },
      },
    }
  }
}

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct EventRecorder {
  events: Mutex<Vec<RecordedEvent>>,
}

impl EventRecorder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<RecordedEvent> {
    self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  /// Recorded events other than messages.
  pub fn lifecycle(&self) -> Vec<RecordedEvent> {
    self
      .events()
      .into_iter()
      .filter(|event| !matches!(event, RecordedEvent::Message { .. }))
      .collect()
  }

  /// Text of every message recorded at exactly `level`.
  pub fn messages_at(&self, level: MessageLevel) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|event| match event {
        RecordedEvent::Message { level: l, text, .. } if l == level => Some(text),
        _ => None,
      })
      .collect()
  }

  pub fn has_message(&self, level: MessageLevel, text: &str) -> bool {
    self.messages_at(level).iter().any(|m| m == text)
  }
}

impl BuildListener for EventRecorder {
  fn on_event(&self, event: &BuildEvent<'_>) -> Result<(), ListenerError> {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(RecordedEvent::capture(event));
    Ok(())
  }
}
