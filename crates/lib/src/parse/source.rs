//! Turns build file text into a stream of element events.

use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use super::ParseError;
use crate::model::Location;

/// Receives element events in document order.
pub trait EventSink {
  fn start_element(&mut self, name: &str, attributes: &[(String, String)], location: Location)
  -> Result<(), ParseError>;

  fn characters(&mut self, text: &str, location: Location) -> Result<(), ParseError>;

  fn end_element(&mut self, name: &str, location: Location) -> Result<(), ParseError>;
}

enum Step<'a, 'input> {
  Enter(Node<'a, 'input>),
  Leave(Node<'a, 'input>),
}

/// Parse `text` and feed its root element to `sink`.
///
/// The tree is walked with an explicit stack, so deeply nested documents do
/// not grow the call stack. Comments and processing instructions are
/// skipped.
pub fn drive(text: &str, file: Option<&Path>, sink: &mut impl EventSink) -> Result<(), ParseError> {
  let mut options = ParsingOptions::default();
  options.allow_dtd = true;

  let doc = Document::parse_with_options(text, options).map_err(|source| ParseError::Xml {
    file: file.map(Path::to_path_buf),
    source,
  })?;

  let location = |pos: usize| {
    let at = doc.text_pos_at(pos);
    Location::new(file.map(Path::to_path_buf), at.row, at.col)
  };

  let mut stack = vec![Step::Enter(doc.root_element())];
  while let Some(step) = stack.pop() {
    match step {
      Step::Enter(node) if node.is_element() => {
        let attributes: Vec<(String, String)> = node
          .attributes()
          .map(|attr| (attr.name().to_string(), attr.value().to_string()))
          .collect();
        sink.start_element(node.tag_name().name(), &attributes, location(node.range().start))?;

        stack.push(Step::Leave(node));
        for child in node.children().rev() {
          stack.push(Step::Enter(child));
        }
      }
      Step::Enter(node) => {
        if node.is_text()
          && let Some(text) = node.text()
        {
          sink.characters(text, location(node.range().start))?;
        }
      }
      Step::Leave(node) => {
        sink.end_element(node.tag_name().name(), location(node.range().end))?;
      }
    }
  }

  Ok(())
}
