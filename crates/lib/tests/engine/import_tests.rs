use tack_lib::{ExecuteConfig, MessageLevel, ParseError, Project, ProjectParser};

use super::common::{Workspace, build};

#[test]
fn colliding_import_target_renamed_into_its_project() {
  let ws = Workspace::new();
  ws.write(
    "lib.xml",
    r#"<project name="lib">
      <target name="build"><record msg="lib build"/></target>
      <target name="clean"><record msg="lib clean"/></target>
    </project>"#,
  );
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="build">
      <import file="lib.xml"/>
      <target name="build" depends="lib.build"><record msg="main build"/></target>
    </project>"#,
  );

  let (project, recorder, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();

  assert!(project.target("lib.build").is_some());
  assert!(project.target("clean").is_some());
  assert_eq!(*log.lock().unwrap(), ["lib build", "main build"]);
  assert!(recorder.has_message(
    MessageLevel::Verbose,
    "Already defined in main or a previous import, define build as lib.build"
  ));
}

#[test]
fn colliding_target_of_unnamed_import_discarded() {
  let ws = Workspace::new();
  ws.write(
    "lib.xml",
    r#"<project><target name="build"><record msg="lib build"/></target></project>"#,
  );
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="build">
      <import file="lib.xml"/>
      <target name="build"><record msg="main build"/></target>
    </project>"#,
  );

  let (project, recorder, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();

  assert_eq!(project.targets().len(), 1);
  assert_eq!(*log.lock().unwrap(), ["main build"]);
  assert!(recorder.has_message(
    MessageLevel::Warn,
    "Already defined in main or a previous import, ignore build"
  ));
}

#[test]
fn import_path_is_expanded_and_relative_to_importer() {
  let ws = Workspace::new();
  ws.write(
    "shared/common.xml",
    r#"<project name="common"><target name="shared"/></project>"#,
  );
  ws.write(
    "sub/build.xml",
    r#"<project name="main">
      <import file="${shared.dir}/common.xml"/>
    </project>"#,
  );

  let mut project = Project::new();
  project.properties().set_user("shared.dir", "../shared");
  ProjectParser::new()
    .parse_file(&mut project, &ws.temp.path().join("sub/build.xml"))
    .unwrap();

  assert!(project.target("shared").is_some());
}

#[test]
fn repeated_import_read_once() {
  let ws = Workspace::new();
  ws.write("common.xml", r#"<project name="common"><record msg="common"/></project>"#);
  ws.write("a.xml", r#"<project name="a"><import file="common.xml"/></project>"#);
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="t">
      <import file="a.xml"/>
      <import file="common.xml"/>
      <target name="t"/>
    </project>"#,
  );

  let (_, recorder, log, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();

  assert_eq!(*log.lock().unwrap(), ["common"]);
  let skipped = recorder.messages_at(MessageLevel::Verbose);
  assert!(skipped.iter().any(|m| m.starts_with("Skipped already imported file:")));
}

#[test]
fn self_import_is_skipped() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="main"><import file="build.xml"/><target name="t"/></project>"#,
  );

  let mut project = Project::new();
  ProjectParser::new().parse_file(&mut project, &file).unwrap();
  assert_eq!(project.targets().len(), 1);
}

#[test]
fn missing_optional_import_skipped() {
  let ws = Workspace::new();
  let file = ws.write(
    "build.xml",
    r#"<project name="main"><import file="local.xml" optional="true"/></project>"#,
  );

  let (_, recorder, _, result) = build(&file, &["nothing"], ExecuteConfig::default());
  assert!(result.unwrap_err().to_string().contains("\"nothing\" does not exist"));
  assert!(
    recorder
      .messages_at(MessageLevel::Verbose)
      .iter()
      .any(|m| m.starts_with("Cannot find ") && m.contains("local.xml"))
  );
}

#[test]
fn error_in_import_attributed_to_importer() {
  let ws = Workspace::new();
  ws.write("broken.xml", r#"<project><target/></project>"#);
  let file = ws.write(
    "build.xml",
    "<project name=\"main\">\n  <import file=\"broken.xml\"/>\n</project>",
  );

  let mut project = Project::new();
  let err = ProjectParser::new().parse_file(&mut project, &file).unwrap_err();
  let ParseError::Import { location, source, .. } = err else {
    panic!("expected an import error, got {err:?}");
  };
  assert_eq!(location.line, 2);
  assert!(matches!(*source, ParseError::MalformedModel { .. }));
}

#[test]
fn duplicate_project_name_in_import_warns() {
  let ws = Workspace::new();
  ws.write("other.xml", r#"<project name="main"><target name="extra"/></project>"#);
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="extra"><import file="other.xml"/></project>"#,
  );

  let (_, recorder, _, result) = build(&file, &[], ExecuteConfig::default());
  result.unwrap();
  assert!(
    recorder
      .messages_at(MessageLevel::Warn)
      .iter()
      .any(|m| m.starts_with("Duplicated project name in import. Project main defined first in"))
  );
}

#[test]
fn imported_project_attributes_not_applied() {
  let ws = Workspace::new();
  ws.write(
    "lib.xml",
    r#"<project name="lib" default="libdefault" basedir="/elsewhere"><target name="libdefault"/></project>"#,
  );
  let file = ws.write(
    "build.xml",
    r#"<project name="main" default="t"><import file="lib.xml"/><target name="t"/></project>"#,
  );

  let mut project = Project::new();
  ProjectParser::new().parse_file(&mut project, &file).unwrap();

  assert_eq!(project.name(), Some("main"));
  assert_eq!(project.default_target(), Some("t"));
  assert_eq!(project.base_dir(), dunce::canonicalize(ws.temp.path()).unwrap());
}
