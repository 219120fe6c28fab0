mod build;
mod projecthelp;

pub use build::{BuildOptions, cmd_build};
pub use projecthelp::cmd_projecthelp;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tack_lib::Project;

/// Apply `-D` definitions as user properties.
fn apply_defines(project: &Project, defines: &[(String, String)]) {
  for (name, value) in defines {
    project.properties().set_user(name, value.clone());
  }
}

fn locate(file: &Path) -> Result<PathBuf> {
  if !file.is_file() {
    bail!("Buildfile: {} does not exist!", file.display());
  }
  Ok(file.to_path_buf())
}
