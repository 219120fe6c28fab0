mod cmd;
mod logger;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tack_lib::MessageLevel;
use tack_lib::consts::DEFAULT_BUILD_FILE;
use tracing_subscriber::EnvFilter;

use crate::cmd::BuildOptions;
use crate::output::print_error;

/// Run targets from an XML build file.
#[derive(Parser)]
#[command(name = "tack", version, long_about = None)]
struct Cli {
  /// Build file to read
  #[arg(
    short = 'f',
    long = "file",
    visible_alias = "buildfile",
    env = "TACK_BUILD_FILE",
    default_value = DEFAULT_BUILD_FILE
  )]
  file: PathBuf,

  /// Set a user property
  #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define)]
  define: Vec<(String, String)>,

  /// Keep running targets that do not depend on a failed target
  #[arg(short = 'k', long)]
  keep_going: bool,

  /// Print verbose build messages
  #[arg(short, long, conflicts_with_all = ["debug", "quiet"])]
  verbose: bool,

  /// Print debug build messages
  #[arg(short, long, conflicts_with = "quiet")]
  debug: bool,

  /// Only print warnings and errors
  #[arg(short, long)]
  quiet: bool,

  /// List the project's targets instead of running them
  #[arg(short = 'p', long)]
  projecthelp: bool,

  /// Print the target listing as JSON
  #[arg(long, requires = "projecthelp")]
  json: bool,

  /// Targets to run (the project's default target if none)
  targets: Vec<String>,
}

impl Cli {
  fn level(&self) -> MessageLevel {
    if self.debug {
      MessageLevel::Debug
    } else if self.verbose {
      MessageLevel::Verbose
    } else if self.quiet {
      MessageLevel::Warn
    } else {
      MessageLevel::Info
    }
  }
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((name, _)) if name.is_empty() => Err(format!("missing property name in '{raw}'")),
    Some((name, value)) => Ok((name.to_string(), value.to_string())),
    None => Ok((raw.to_string(), String::new())),
  }
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let cli = Cli::parse();

  let result = if cli.projecthelp {
    cmd::cmd_projecthelp(&cli.file, &cli.define, cli.verbose, cli.json).map(|()| ExitCode::SUCCESS)
  } else {
    cmd::cmd_build(&BuildOptions {
      file: &cli.file,
      defines: &cli.define,
      targets: &cli.targets,
      keep_going: cli.keep_going,
      level: cli.level(),
    })
  };

  match result {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
