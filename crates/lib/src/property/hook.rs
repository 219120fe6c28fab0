//! Pluggable property resolution hooks.
//!
//! Hooks let an embedding application back some property names with its own
//! storage. The store consults hooks in registration order; a hook declines a
//! name by returning `None` from [`PropertyHook::get`] or `false` from
//! [`PropertyHook::set`].

/// How a property write was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
  /// A plain overwriting `set`.
  Normal,
  /// A `set_if_absent` that found no existing value.
  New,
  /// A user property write.
  User,
  /// A user property inherited from a parent build.
  Inherited,
}

/// A property resolution hook.
///
/// Hooks run while the store holds its table lock and must not call back
/// into the store.
pub trait PropertyHook: Send + Sync {
  /// Resolve `name`, or return `None` to decline.
  ///
  /// `user` is true when the caller asked only for user properties.
  fn get(&self, name: &str, user: bool) -> Option<String>;

  /// Claim a write. Returns false to let the store handle it.
  fn set(&self, _name: &str, _value: &str, _kind: SetKind) -> bool {
    false
  }
}

/// Exposes process environment variables as `<prefix>.<VAR>`.
///
/// Writes are always declined.
#[derive(Debug, Clone)]
pub struct EnvironmentHook {
  prefix: String,
}

impl EnvironmentHook {
  pub fn new(prefix: impl Into<String>) -> Self {
    let mut prefix = prefix.into();
    if !prefix.ends_with('.') {
      prefix.push('.');
    }
    Self { prefix }
  }
}

impl PropertyHook for EnvironmentHook {
  fn get(&self, name: &str, user: bool) -> Option<String> {
    if user {
      return None;
    }
    let var = name.strip_prefix(&self.prefix)?;
    std::env::var(var).ok()
  }
}
