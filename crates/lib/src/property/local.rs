//! Scoped local property bindings.
//!
//! A [`LocalStack`] is a list of frames, one per entered scope. Each frame
//! binds names to optional values; a binding without a value still shadows
//! outer frames and the global tables. The store keeps one stack per thread
//! and hands worker threads an explicit clone taken at the branch point.

use std::collections::HashMap;

use super::PropertyError;

/// One scope's bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Frame {
  bindings: HashMap<String, Option<String>>,
}

/// The local property frames visible to one thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalStack {
  frames: Vec<Frame>,
}

impl LocalStack {
  /// Create an empty stack with no scopes entered.
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of entered scopes.
  pub fn depth(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  /// Push a new empty frame.
  pub fn enter(&mut self) {
    self.frames.push(Frame::default());
  }

  /// Pop the innermost frame, dropping its bindings.
  ///
  /// Returns false if no scope was entered.
  pub fn exit(&mut self) -> bool {
    self.frames.pop().is_some()
  }

  /// Bind `name` in the innermost frame.
  ///
  /// Returns `Ok(false)` when no scope has been entered; the binding is
  /// dropped in that case.
  pub fn add(&mut self, name: &str, value: Option<String>) -> Result<bool, PropertyError> {
    let Some(frame) = self.frames.last_mut() else {
      return Ok(false);
    };
    if frame.bindings.contains_key(name) {
      return Err(PropertyError::DuplicateLocal { name: name.to_string() });
    }
    frame.bindings.insert(name.to_string(), value);
    Ok(true)
  }

  /// The innermost binding for `name`, if any frame binds it.
  ///
  /// The outer `Option` tells whether a binding exists; the inner one is the
  /// bound value.
  pub fn lookup(&self, name: &str) -> Option<&Option<String>> {
    self.frames.iter().rev().find_map(|frame| frame.bindings.get(name))
  }

  /// Update the innermost binding for `name`.
  ///
  /// Returns false if no frame binds it.
  pub fn assign(&mut self, name: &str, value: &str) -> bool {
    match self.frames.iter_mut().rev().find_map(|frame| frame.bindings.get_mut(name)) {
      Some(slot) => {
        *slot = Some(value.to_string());
        true
      }
      None => false,
    }
  }

  /// All visible bindings, inner frames shadowing outer ones.
  pub fn visible(&self) -> HashMap<String, Option<String>> {
    let mut merged = HashMap::new();
    for frame in &self.frames {
      for (name, value) in &frame.bindings {
        merged.insert(name.clone(), value.clone());
      }
    }
    merged
  }
}
