//! Shared helpers for engine tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tack_lib::event::recorder::EventRecorder;
use tack_lib::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};
use tack_lib::{BuildError, ExecuteConfig, Project, run_build};
use tempfile::TempDir;

/// A temporary directory holding build files.
pub struct Workspace {
  pub temp: TempDir,
}

impl Workspace {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the workspace root and return its path.
  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }
}

/// Values seen by `record` tasks, in execution order.
pub type Log = Arc<Mutex<Vec<String>>>;

/// Stores its `msg` attribute in a shared log when run.
struct Record {
  msg: String,
  log: Log,
}

impl Task for Record {
  fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
    if name == "msg" {
      self.msg = value.to_string();
    }
    Ok(())
  }

  fn execute(&mut self, _ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    self.log.lock().unwrap().push(self.msg.clone());
    Ok(())
  }
}

/// A project with a recorder attached and a `record` task registered.
pub fn project() -> (Project, Arc<EventRecorder>, Log) {
  let mut project = Project::new();
  let recorder = Arc::new(EventRecorder::new());
  project.bus().subscribe(recorder.clone());

  let log: Log = Arc::default();
  let shared = Arc::clone(&log);
  project.registry_mut().register(TaskSchema::new("record").required("msg"), move || {
    Box::new(Record {
      msg: String::new(),
      log: Arc::clone(&shared),
    }) as Box<dyn Task>
  });

  (project, recorder, log)
}

/// Run `targets` of the build file at `file` in a fresh project.
pub fn build(
  file: &std::path::Path,
  targets: &[&str],
  config: ExecuteConfig,
) -> (Project, Arc<EventRecorder>, Log, Result<(), BuildError>) {
  let (mut project, recorder, log) = project();
  let result = run_build(&mut project, file, targets, config);
  (project, recorder, log, result)
}
