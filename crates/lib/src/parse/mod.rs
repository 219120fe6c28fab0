//! Reading build files into a [`Project`].
//!
//! [`source`] turns markup into element events and [`builder`] turns those
//! events into targets and task descriptors. [`ProjectParser`] ties them
//! together and follows `<import>` elements.

mod builder;
pub mod source;

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::BUILD_FILE_PROPERTY;
use crate::error::BuildError;
use crate::event::{MessageLevel, PublishError};
use crate::execute::Executor;
use crate::model::{Location, Project};
use crate::property::PropertyError;
use crate::property::expand::expand;
use crate::util::resolve_against;

use builder::{ModelBuilder, PendingImport};

/// Errors raised while reading a build file.
#[derive(Debug, Error)]
pub enum ParseError {
  /// The document is well-formed markup but not a valid build file.
  #[error("{location}: {message}")]
  MalformedModel { message: String, location: Location },

  #[error("{location}: Unexpected element \"{element}\"")]
  UnexpectedElement { element: String, location: Location },

  #[error("{}: {source}", display_file(.file))]
  Xml {
    file: Option<PathBuf>,
    source: roxmltree::Error,
  },

  #[error("failed to read {}: {source}", path.display())]
  Io { path: PathBuf, source: io::Error },

  /// A required import does not exist.
  #[error("{location}: Cannot find {} imported from {}", file.display(), display_file(&location.file))]
  MissingImport { file: PathBuf, location: Location },

  /// An error inside an imported document, attributed to the `<import>`.
  #[error("{location}: in {}: {source}", file.display())]
  Import {
    file: PathBuf,
    location: Location,
    source: Box<ParseError>,
  },

  #[error("{location}: {source}")]
  Property { source: PropertyError, location: Location },

  #[error(transparent)]
  Listener(#[from] PublishError),
}

fn display_file(file: &Option<PathBuf>) -> String {
  match file {
    Some(file) => file.display().to_string(),
    None => "<string>".to_string(),
  }
}

/// Parses build files, following imports.
///
/// One parser should be used per top-level document so that files imported
/// twice are read only once.
#[derive(Debug, Default)]
pub struct ProjectParser {
  seen: HashSet<PathBuf>,
}

impl ProjectParser {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse the build file at `path` into `project`.
  pub fn parse_file(&mut self, project: &mut Project, path: &Path) -> Result<(), ParseError> {
    let path = canonical(path)?;
    let text = read(&path)?;
    self.seen.insert(path.clone());
    info!(file = %path.display(), "parsing build file");
    self.parse_document(project, &text, Some(&path), false)
  }

  /// Parse build file `text` into `project`.
  ///
  /// `name` is used for locations and to resolve relative imports; without it
  /// imports resolve against the project base directory.
  pub fn parse_str(&mut self, project: &mut Project, text: &str, name: Option<&Path>) -> Result<(), ParseError> {
    if let Some(name) = name {
      self.seen.insert(name.to_path_buf());
    }
    self.parse_document(project, text, name, false)
  }

  fn parse_document(
    &mut self,
    project: &mut Project,
    text: &str,
    file: Option<&Path>,
    imported: bool,
  ) -> Result<(), ParseError> {
    let mut builder = ModelBuilder::new(project, file, imported);
    source::drive(text, file, &mut builder)?;
    let imports = builder.finish()?;

    for import in imports {
      self.import(project, file, import)?;
    }
    Ok(())
  }

  fn import(&mut self, project: &mut Project, importer: Option<&Path>, import: PendingImport) -> Result<(), ParseError> {
    let PendingImport {
      file,
      optional,
      location,
    } = import;

    let expanded = expand(&file, project.properties()).map_err(|source| ParseError::Property {
      source,
      location: location.clone(),
    })?;
    let dir = match importer.and_then(Path::parent) {
      Some(dir) => dir.to_path_buf(),
      None => project.base_dir().to_path_buf(),
    };
    let path = resolve_against(&dir, expanded);

    if !path.exists() {
      if optional {
        project.log(
          MessageLevel::Verbose,
          &format!(
            "Cannot find {} imported from {}",
            path.display(),
            display_file(&location.file)
          ),
        )?;
        return Ok(());
      }
      return Err(ParseError::MissingImport { file: path, location });
    }

    if !self.seen.insert(path.clone()) {
      project.log(
        MessageLevel::Verbose,
        &format!("Skipped already imported file:\n   {}\n", path.display()),
      )?;
      return Ok(());
    }

    debug!(file = %path.display(), "importing");
    let wrap = |source: ParseError| ParseError::Import {
      file: path.clone(),
      location: location.clone(),
      source: Box::new(source),
    };
    let text = read(&path).map_err(wrap)?;
    self.parse_document(project, &text, Some(&path), true).map_err(wrap)
  }
}

fn canonical(path: &Path) -> Result<PathBuf, ParseError> {
  dunce::canonicalize(path).map_err(|source| ParseError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn read(path: &Path) -> Result<String, ParseError> {
  fs::read_to_string(path).map_err(|source| ParseError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Read `path` into `project` and run the tasks declared outside targets.
///
/// Sets the `tack.file` user property to the build file's path.
pub fn configure_project(project: &mut Project, path: &Path) -> Result<(), BuildError> {
  let path = canonical(path)?;
  project
    .properties()
    .set_user(BUILD_FILE_PROPERTY, path.display().to_string());

  ProjectParser::new().parse_file(project, &path)?;
  Executor::new(project).run_implicit()?;
  Ok(())
}
