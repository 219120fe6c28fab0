//! Running targets.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tack_lib::consts::ENV_PREFIX;
use tack_lib::property::EnvironmentHook;
use tack_lib::{ExecuteConfig, MessageLevel, Project, run_build};
use tracing::debug;

use super::{apply_defines, locate};
use crate::logger::ConsoleLogger;

pub struct BuildOptions<'a> {
  pub file: &'a Path,
  pub defines: &'a [(String, String)],
  pub targets: &'a [String],
  pub keep_going: bool,
  pub level: MessageLevel,
}

pub fn cmd_build(options: &BuildOptions<'_>) -> Result<ExitCode> {
  let file = locate(options.file)?;

  let mut project = Project::new();
  project
    .properties()
    .add_hook(Arc::new(EnvironmentHook::new(ENV_PREFIX)));
  project.bus().subscribe(Arc::new(ConsoleLogger::new(options.level)));
  apply_defines(&project, options.defines);

  if options.level >= MessageLevel::Info {
    println!("Buildfile: {}", file.display());
  }

  let config = if options.keep_going {
    ExecuteConfig::keep_going()
  } else {
    ExecuteConfig::default()
  };

  match run_build(&mut project, &file, options.targets, config) {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(err) => {
      // Already reported by the logger through BuildFinished.
      debug!(error = %err, "build failed");
      Ok(ExitCode::FAILURE)
    }
  }
}
