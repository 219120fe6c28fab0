use std::sync::Arc;
use std::thread;

use tack_lib::property::PropertyHook;
use tack_lib::{ExecuteConfig, MessageLevel, PropertyStore};

use super::common::{Workspace, build, project};

#[test]
fn user_property_wins_over_build_file() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t">
      <property name="mode" value="debug"/>
      <target name="t"><record msg="mode=${mode}"/></target>
    </project>"#,
  );

  let (mut project, recorder, log) = project();
  project.properties().set_user("mode", "release");
  tack_lib::run_build(&mut project, &file, &["t"], ExecuteConfig::default()).unwrap();

  assert_eq!(*log.lock().unwrap(), ["mode=release"]);
  assert!(recorder.has_message(MessageLevel::Verbose, "Override ignored for property \"mode\""));
}

#[test]
fn unset_reference_left_in_place() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t"><target name="t"><record msg="price: $$5 for ${missing}"/></target></project>"#,
  );

  let (_, recorder, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();

  assert_eq!(*log.lock().unwrap(), ["price: $5 for ${missing}"]);
  let unresolved: Vec<_> = recorder
    .messages_at(MessageLevel::Verbose)
    .into_iter()
    .filter(|m| m == "Property \"missing\" has not been set")
    .collect();
  assert_eq!(unresolved.len(), 1);
}

#[test]
fn attributes_expand_when_the_task_runs() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t">
      <target name="init"><property name="version" value="1.2"/></target>
      <target name="t" depends="init"><record msg="v${version}"/></target>
    </project>"#,
  );

  let (_, _, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();
  assert_eq!(*log.lock().unwrap(), ["v1.2"]);
}

#[test]
fn locals_are_per_thread() {
  let store = Arc::new(PropertyStore::new());
  store.enter_scope();
  store.add_local("x", Some("main".to_string())).unwrap();

  let other = Arc::clone(&store);
  let seen = thread::spawn(move || other.get("x")).join().unwrap();
  assert_eq!(seen, None);

  let branch = store.branch();
  let child = Arc::clone(&store);
  let (inherited, added) = thread::spawn(move || {
    let _adopted = child.adopt(branch);
    let _scope = child.scope();
    child.add_local("y", Some("child".to_string())).unwrap();
    (child.get("x"), child.get("y"))
  })
  .join()
  .unwrap();

  assert_eq!(inherited.as_deref(), Some("main"));
  assert_eq!(added.as_deref(), Some("child"));
  assert_eq!(store.get("y"), None);

  store.exit_scope();
  assert_eq!(store.get("x"), None);
}

/// Serves `computed.*` names.
struct Computed;

impl PropertyHook for Computed {
  fn get(&self, name: &str, _user: bool) -> Option<String> {
    name.strip_prefix("computed.").map(str::to_uppercase)
  }
}

#[test]
fn hooks_answer_lookups() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project default="t"><target name="t"><record msg="${computed.name}"/></target></project>"#,
  );

  let (mut project, _, log) = project();
  project.properties().add_hook(Arc::new(Computed));
  tack_lib::run_build(&mut project, &file, &["t"], ExecuteConfig::default()).unwrap();
  assert_eq!(*log.lock().unwrap(), ["NAME"]);
}
