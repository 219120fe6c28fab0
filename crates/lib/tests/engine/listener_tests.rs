use std::sync::Arc;

use tack_lib::event::{BuildEvent, BuildListener, ListenerError};
use tack_lib::{BuildError, ExecuteConfig, ExecuteError, Executor, ProjectParser};

use super::common::{Workspace, project};

/// Fails on every target start.
struct Rejecting;

impl BuildListener for Rejecting {
  fn on_event(&self, event: &BuildEvent<'_>) -> Result<(), ListenerError> {
    match event {
      BuildEvent::TargetStarted { target } => Err(ListenerError::new(format!("refusing {}", target.name))),
      _ => Ok(()),
    }
  }
}

#[test]
fn listener_error_surfaces_from_execute() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t"><target name="t"><record msg="ran"/></target></project>"#,
  );

  let (mut project, recorder, log) = project();
  project.bus().subscribe(Arc::new(Rejecting));
  let err = tack_lib::run_build(&mut project, &file, &["t"], ExecuteConfig::default()).unwrap_err();

  let BuildError::Execute(ExecuteError::Listener(publish)) = err else {
    panic!("expected a listener error, got {err:?}");
  };
  assert_eq!(publish.failures, [ListenerError::new("refusing t")]);
  assert!(log.lock().unwrap().is_empty());
  // Every listener still saw the event.
  assert!(
    recorder
      .lifecycle()
      .iter()
      .any(|e| matches!(e, tack_lib::event::recorder::RecordedEvent::TargetStarted { .. }))
  );
}

#[test]
fn unsubscribed_listener_no_longer_called() {
  let ws = Workspace::new();
  let file = ws.write("build.xml", r#"<project><target name="t"/></project>"#);

  let (mut project, _, _) = project();
  let id = project.bus().subscribe(Arc::new(Rejecting));
  assert!(project.bus().unsubscribe(id));

  ProjectParser::new().parse_file(&mut project, &file).unwrap();
  Executor::new(&project).execute(&["t"]).unwrap();
}
