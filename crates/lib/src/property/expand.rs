//! Property reference parsing and substitution.
//!
//! Attribute values and text in a build file may reference properties with
//! `${name}`. References are resolved lazily, when the task that owns the
//! value is configured, so properties set by earlier tasks are visible.
//!
//! # Dollar Handling
//!
//! - `${name}` - replaced by the value of `name`; left as-is when unset
//! - `$$` - a single literal `$`
//! - `$X` for any other `X` - passes through unchanged
//! - a trailing `$` - passes through unchanged
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use tack_lib::property::expand::{Segment, expand, parse};
//!
//! let segments = parse("${src}/bin:$HOME").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Reference("src".to_string()),
//!     Segment::Literal("/bin:$HOME".to_string()),
//! ]);
//!
//! let props = HashMap::from([("src".to_string(), "/work".to_string())]);
//! assert_eq!(expand("${src}/bin", &props).unwrap(), "/work/bin");
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::PropertyError;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (escapes already collapsed).
  Literal(String),

  /// A `${name}` reference.
  Reference(String),
}

/// Something that can answer property lookups during expansion.
pub trait PropertySource {
  /// Look up a property value. `None` means unset.
  fn property(&self, name: &str) -> Option<String>;

  /// Called once for every reference that could not be resolved.
  fn unresolved(&self, name: &str) {
    debug!(property = name, "property has not been set");
  }
}

impl PropertySource for HashMap<String, String> {
  fn property(&self, name: &str) -> Option<String> {
    self.get(name).cloned()
  }
}

/// Split a string into literal text and property references.
///
/// # Errors
///
/// Returns `MalformedReference` if a `${` has no closing `}`.
pub fn parse(input: &str) -> Result<Vec<Segment>, PropertyError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(pos) = rest.find('$') {
    literal.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    match after.chars().next() {
      None => {
        // Trailing lone $
        literal.push('$');
        rest = after;
      }
      Some('$') => {
        // $$ collapses to a single $
        literal.push('$');
        rest = &after[1..];
      }
      Some('{') => {
        let end = after.find('}').ok_or_else(|| PropertyError::MalformedReference {
          text: input.to_string(),
        })?;

        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Reference(after[1..end].to_string()));
        rest = &after[end + 1..];
      }
      Some(other) => {
        // $X stays $X
        literal.push('$');
        literal.push(other);
        rest = &after[other.len_utf8()..];
      }
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Expand every `${name}` reference in `input` using `source`.
///
/// Unresolved references are kept verbatim and reported through
/// [`PropertySource::unresolved`]; they never fail the expansion.
pub fn expand(input: &str, source: &(impl PropertySource + ?Sized)) -> Result<String, PropertyError> {
  if !input.contains('$') {
    return Ok(input.to_string());
  }
  let segments = parse(input)?;
  Ok(substitute_segments(&segments, source))
}

/// Substitute references in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], source: &(impl PropertySource + ?Sized)) -> String {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Reference(name) => match source.property(name) {
        Some(value) => result.push_str(&value),
        None => {
          source.unresolved(name);
          result.push_str("${");
          result.push_str(name);
          result.push('}');
        }
      },
    }
  }

  result
}

/// Names referenced by `input`, in order of appearance.
pub fn references(input: &str) -> Result<Vec<String>, PropertyError> {
  Ok(
    parse(input)?
      .into_iter()
      .filter_map(|segment| match segment {
        Segment::Reference(name) => Some(name),
        Segment::Literal(_) => None,
      })
      .collect(),
  )
}
