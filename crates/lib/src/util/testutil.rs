//! Helpers for tests that parse and run small build files.

use std::sync::Arc;

use crate::error::BuildError;
use crate::event::recorder::EventRecorder;
use crate::execute::Executor;
use crate::model::Project;
use crate::parse::ProjectParser;

/// Outcome of [`run_build`].
pub struct BuildRun {
  pub project: Project,
  pub result: Result<(), BuildError>,
  pub recorder: Arc<EventRecorder>,
}

fn load(xml: &str) -> (Project, Arc<EventRecorder>, Result<(), BuildError>) {
  let mut project = Project::new();
  let recorder = Arc::new(EventRecorder::new());
  project.bus().subscribe(recorder.clone());

  let result = ProjectParser::new()
    .parse_str(&mut project, xml, None)
    .map_err(BuildError::from)
    .and_then(|()| Executor::new(&project).run_implicit().map_err(BuildError::from));
  (project, recorder, result)
}

/// Parse `xml`, run its implicit target and then its default target.
pub fn run_build(xml: &str) -> BuildRun {
  let (project, recorder, loaded) = load(xml);
  let result = loaded.and_then(|()| Executor::new(&project).execute::<&str>(&[]).map_err(BuildError::from));
  BuildRun {
    project,
    result,
    recorder,
  }
}

/// Parse `xml` and run its implicit target, panicking on failure.
pub fn recording(xml: &str) -> (Project, Arc<EventRecorder>) {
  let (project, recorder, loaded) = load(xml);
  if let Err(err) = loaded {
    panic!("failed to load test project: {err}");
  }
  (project, recorder)
}
