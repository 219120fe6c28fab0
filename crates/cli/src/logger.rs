//! Console rendering of build events.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use owo_colors::{OwoColorize, Stream};
use tack_lib::event::{BuildEvent, BuildListener, Cause, ListenerError, MessageSource};
use tack_lib::MessageLevel;

use crate::output::format_elapsed;

/// Width of the right-aligned `[task]` column.
const LABEL_WIDTH: usize = 12;

/// Prints build messages at or above a threshold, target headers and a
/// closing summary.
pub struct ConsoleLogger {
  threshold: MessageLevel,
  started: Mutex<Option<Instant>>,
}

impl ConsoleLogger {
  pub fn new(threshold: MessageLevel) -> Self {
    Self {
      threshold,
      started: Mutex::new(None),
    }
  }

  fn shows(&self, level: MessageLevel) -> bool {
    level <= self.threshold
  }

  fn finish(&self, cause: &Cause<'_>) {
    let started = self.started.lock().unwrap_or_else(PoisonError::into_inner).take();

    match cause {
      None => {
        if self.shows(MessageLevel::Info) {
          println!();
          println!("{}", "BUILD SUCCESSFUL".if_supports_color(Stream::Stdout, |s| s.green()));
        }
      }
      Some(err) => {
        eprintln!();
        eprintln!("{}", "BUILD FAILED".if_supports_color(Stream::Stderr, |s| s.red()));
        eprintln!("{err}");
      }
    }

    if let Some(started) = started
      && (cause.is_some() || self.shows(MessageLevel::Info))
    {
      println!("Total time: {}", format_elapsed(started.elapsed()));
    }
  }
}

/// Render `text` with every line prefixed by the right-aligned label.
pub fn prefixed(label: &str, text: &str) -> String {
  let tag = format!("[{label}] ");
  let lines: Vec<String> = text
    .lines()
    .map(|line| format!("{tag:>width$}{line}", width = LABEL_WIDTH + 1))
    .collect();
  if lines.is_empty() {
    format!("{tag:>width$}", width = LABEL_WIDTH + 1)
  } else {
    lines.join("\n")
  }
}

impl BuildListener for ConsoleLogger {
  fn on_event(&self, event: &BuildEvent<'_>) -> Result<(), ListenerError> {
    match event {
      BuildEvent::BuildStarted => {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
      }
      BuildEvent::BuildFinished { cause } => self.finish(cause),
      BuildEvent::TargetStarted { target } => {
        if self.shows(MessageLevel::Info) {
          println!();
          println!("{}:", target.name.if_supports_color(Stream::Stdout, |s| s.bold()));
        }
      }
      BuildEvent::Message { source, level, text } => {
        if !self.shows(*level) {
          return Ok(());
        }
        let line = match source {
          MessageSource::Task { label, .. } => prefixed(label, text),
          MessageSource::Project | MessageSource::Target(_) => text.to_string(),
        };
        match level {
          MessageLevel::Error => eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.red())),
          MessageLevel::Warn => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.yellow())),
          _ => println!("{line}"),
        }
      }
      BuildEvent::TargetFinished { .. } | BuildEvent::TaskStarted { .. } | BuildEvent::TaskFinished { .. } => {}
    }
    Ok(())
  }
}
