//! CLI output helpers.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const ERROR: &str = "✗";
}

/// Elapsed time rounded to milliseconds, e.g. `1s 250ms`.
pub fn format_elapsed(duration: Duration) -> String {
  let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
  humantime::format_duration(Duration::from_millis(millis)).to_string()
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
