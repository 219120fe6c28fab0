//! Listing a project's targets.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};
use tack_lib::model::{ProjectSummary, TargetSummary};
use tack_lib::{Project, ProjectParser};

use super::{apply_defines, locate};
use crate::output::print_json;

pub fn cmd_projecthelp(file: &Path, defines: &[(String, String)], verbose: bool, json: bool) -> Result<()> {
  let file = locate(file)?;

  let mut project = Project::new();
  apply_defines(&project, defines);
  ProjectParser::new()
    .parse_file(&mut project, &file)
    .with_context(|| format!("Failed to read build file: {}", file.display()))?;

  let summary = project.summary();
  if json {
    return print_json(&summary);
  }

  print!("{}", render(&summary, verbose));
  Ok(())
}

/// Text listing: described targets first, then the rest.
fn render(summary: &ProjectSummary, verbose: bool) -> String {
  let mut out = String::new();
  if let Some(description) = &summary.description {
    out.push_str(description);
    out.push('\n');
  }

  let (main, other): (Vec<&TargetSummary>, Vec<&TargetSummary>) =
    summary.targets.iter().partition(|t| t.description.is_some());

  section(&mut out, "Main targets:", &main);
  if verbose || main.is_empty() {
    section(&mut out, "Other targets:", &other);
  }

  if let Some(default) = &summary.default_target {
    out.push_str(&format!("Default target: {default}\n"));
  }
  out
}

fn section(out: &mut String, title: &str, targets: &[&TargetSummary]) {
  out.push('\n');
  out.push_str(&format!("{}\n\n", title.if_supports_color(Stream::Stdout, |s| s.bold())));

  let width = targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
  for target in targets {
    match &target.description {
      Some(description) => out.push_str(&format!(" {:<width$}  {description}\n", target.name)),
      None => out.push_str(&format!(" {}\n", target.name)),
    }
  }
}
