use tack_lib::event::recorder::RecordedEvent;
use tack_lib::graph::GraphError;
use tack_lib::{BuildError, ExecuteConfig, ExecuteError, MessageLevel};

use super::common::{Workspace, build, project};

#[test]
fn dependencies_run_before_dependents() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="order" default="A">
      <target name="A" depends="B,C"><record msg="A"/></target>
      <target name="B" depends="C"><record msg="B"/></target>
      <target name="C"><record msg="C"/></target>
    </project>"#,
  );

  let (_, _, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();
  assert_eq!(*log.lock().unwrap(), ["C", "B", "A"]);
}

#[test]
fn condition_met_runs_tasks_with_expanded_attributes() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="deploy">
      <target name="deploy" if="env"><record msg="Deploying to ${env}"/></target>
    </project>"#,
  );

  let (mut project, recorder, log) = project();
  project.properties().set_user("env", "prod");
  tack_lib::run_build(&mut project, &file, &["deploy"], ExecuteConfig::default()).unwrap();

  assert_eq!(*log.lock().unwrap(), ["Deploying to prod"]);
  assert_eq!(
    recorder.lifecycle(),
    [
      RecordedEvent::BuildStarted,
      RecordedEvent::TargetStarted {
        target: "deploy".to_string()
      },
      RecordedEvent::TaskStarted {
        task: "record".to_string(),
        target: "deploy".to_string()
      },
      RecordedEvent::TaskFinished {
        task: "record".to_string(),
        cause: None
      },
      RecordedEvent::TargetFinished {
        target: "deploy".to_string(),
        cause: None
      },
      RecordedEvent::BuildFinished { cause: None },
    ]
  );
}

#[test]
fn condition_unmet_skips_all_tasks() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="deploy">
      <target name="deploy" if="env"><record msg="Deploying to ${env}"/></target>
    </project>"#,
  );

  let (_, recorder, log, result) = build(&file, &["deploy"], ExecuteConfig::default());
  result.unwrap();

  assert!(log.lock().unwrap().is_empty());
  assert_eq!(
    recorder.lifecycle(),
    [
      RecordedEvent::BuildStarted,
      RecordedEvent::TargetStarted {
        target: "deploy".to_string()
      },
      RecordedEvent::TargetFinished {
        target: "deploy".to_string(),
        cause: None
      },
      RecordedEvent::BuildFinished { cause: None },
    ]
  );
  assert!(recorder.has_message(MessageLevel::Verbose, "Skipped because property 'env' not set."));
}

#[test]
fn cycle_fails_before_any_task() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project>
      <target name="A" depends="B"><record msg="A"/></target>
      <target name="B" depends="A"><record msg="B"/></target>
    </project>"#,
  );

  let (_, _, log, result) = build(&file, &["A"], ExecuteConfig::default());
  let err = result.unwrap_err();
  assert!(err.to_string().contains("circular dependency"), "{err}");
  assert!(log.lock().unwrap().is_empty());
}

#[test]
fn implicit_tasks_run_once_before_targets() {
  let ws = Workspace::new();
  ws.write(
    "common.xml",
    r#"<project name="common"><record msg="imported top-level"/></project>"#,
  );
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="t">
      <record msg="main top-level"/>
      <import file="common.xml"/>
      <target name="t"><record msg="target"/></target>
    </project>"#,
  );

  let (_, _, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();
  assert_eq!(*log.lock().unwrap(), ["main top-level", "imported top-level", "target"]);
}

#[test]
fn keep_going_reports_failures_and_skips_dependents() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project>
      <target name="compile"><fail message="syntax error"/></target>
      <target name="package" depends="compile"><record msg="package"/></target>
      <target name="docs"><record msg="docs"/></target>
    </project>"#,
  );

  let (_, recorder, log, result) = build(&file, &["package", "docs"], ExecuteConfig::keep_going());

  assert!(matches!(
    result,
    Err(BuildError::Execute(ExecuteError::Failed { count: 1 }))
  ));
  assert_eq!(*log.lock().unwrap(), ["docs"]);
  assert!(recorder.has_message(
    MessageLevel::Error,
    "Target 'compile' failed with message 'syntax error'."
  ));
  assert!(recorder.has_message(
    MessageLevel::Error,
    "Cannot execute 'package' - 'compile' failed or was not executed."
  ));
}

#[test]
fn keep_going_runs_targets_independent_of_a_missing_dependency() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project>
      <target name="broken" depends="missing"><record msg="broken"/></target>
      <target name="independent"><record msg="independent"/></target>
    </project>"#,
  );

  let (_, recorder, log, result) = build(&file, &["broken", "independent"], ExecuteConfig::keep_going());

  assert!(matches!(
    result,
    Err(BuildError::Execute(ExecuteError::Failed { count: 1 }))
  ));
  assert_eq!(*log.lock().unwrap(), ["independent"]);
  assert!(recorder.has_message(
    MessageLevel::Error,
    "Target 'broken' failed with message 'target \"missing\" does not exist in the project; it is used from target \"broken\"'."
  ));
}

#[test]
fn missing_dependency_halts_without_keep_going() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project>
      <target name="broken" depends="missing"><record msg="broken"/></target>
      <target name="independent"><record msg="independent"/></target>
    </project>"#,
  );

  let (_, _, log, result) = build(&file, &["broken", "independent"], ExecuteConfig::default());

  assert!(matches!(
    result,
    Err(BuildError::Execute(ExecuteError::Graph(GraphError::UnresolvedDependency { ref dependency, .. })))
      if dependency == "missing"
  ));
  assert!(log.lock().unwrap().is_empty());
}

#[test]
fn unknown_attribute_fails_at_configuration() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t">
      <target name="t"><record msg="ok" colour="blue"/></target>
    </project>"#,
  );

  let (_, recorder, log, result) = build(&file, &[], ExecuteConfig::default());
  assert!(matches!(
    result,
    Err(BuildError::Execute(ExecuteError::Configuration { ref task, .. })) if task == "record"
  ));
  assert!(log.lock().unwrap().is_empty());

  let finished = recorder.lifecycle().into_iter().last().unwrap();
  assert!(matches!(finished, RecordedEvent::BuildFinished { cause: Some(ref c) } if c.contains("colour")));
}

#[test]
fn duplicate_singular_child_fails_at_parse_time() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t">
      <target name="t">
        <wrapper><single/><single/></wrapper>
      </target>
    </project>"#,
  );

  let (mut project, _, _) = project();
  project
    .registry_mut()
    .register(tack_lib::task::TaskSchema::new("wrapper").single_element("single"), || {
      unreachable!("the build file never gets far enough to create a task")
    });
  let err = tack_lib::run_build(&mut project, &file, &["t"], ExecuteConfig::default()).unwrap_err();

  assert!(matches!(err, BuildError::Parse(tack_lib::ParseError::MalformedModel { .. })));
  assert!(err.to_string().contains("wrapper accepts only one nested \"single\" element"));
}

#[test]
fn build_file_property_points_at_file() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="self" default="t"><record msg="${tack.file}"/><target name="t"/></project>"#,
  );

  let (project, _, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();

  let canonical = dunce::canonicalize(&file).unwrap().display().to_string();
  assert_eq!(*log.lock().unwrap(), [canonical.clone()]);
  assert_eq!(project.properties().get("tack.file.self"), Some(canonical));
}
