use std::thread;

use tracing::debug;

use crate::model::TaskDescriptor;
use crate::task::{ConfigError, Task, TaskContext, TaskError, TaskSchema};

pub(super) fn schema() -> TaskSchema {
  TaskSchema::new("parallel").nested_tasks()
}

/// Runs each nested task on its own thread.
///
/// Every worker starts from a copy of the caller's local properties and
/// enters its own scope, so locals bound by one branch are invisible to the
/// others and to the caller. All branches run to completion; the first
/// failure in declaration order is reported.
#[derive(Debug, Default)]
pub struct Parallel {
  tasks: Vec<TaskDescriptor>,
}

impl Task for Parallel {
  fn set_attribute(&mut self, _name: &str, _value: &str) -> Result<(), ConfigError> {
    Ok(())
  }

  fn add_task(&mut self, task: TaskDescriptor) -> Result<(), ConfigError> {
    self.tasks.push(task);
    Ok(())
  }

  fn execute(&mut self, ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    let properties = ctx.properties();
    debug!(branches = self.tasks.len(), "starting parallel tasks");

    let results: Vec<Result<(), TaskError>> = thread::scope(|scope| {
      let handles: Vec<_> = self
        .tasks
        .iter()
        .map(|task| {
          let branch = properties.branch();
          scope.spawn(move || {
            let _adopted = properties.adopt(branch);
            let _scope = properties.scope();
            ctx.run_task(task)
          })
        })
        .collect();

      handles
        .into_iter()
        .map(|handle| {
          handle
            .join()
            .unwrap_or_else(|_| Err(TaskError::failed("parallel branch panicked")))
        })
        .collect()
    });

    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
  }
}

#[cfg(test)]
mod tests {
  use crate::event::MessageLevel;
  use crate::util::testutil::run_build;

  #[test]
  fn branches_have_isolated_locals() {
    let run = run_build(
      r#"<project default="main">
        <target name="main">
          <local name="who" value="caller"/>
          <parallel>
            <sequential><local name="who" value="left"/><echo message="left=${who}"/></sequential>
            <sequential><local name="who" value="right"/><echo message="right=${who}"/></sequential>
            <echo message="plain=${who}"/>
          </parallel>
          <echo message="after=${who}"/>
        </target>
      </project>"#,
    );
    run.result.unwrap();
    for expected in ["left=left", "right=right", "plain=caller", "after=caller"] {
      assert!(run.recorder.has_message(MessageLevel::Info, expected), "missing {expected}");
    }
  }

  #[test]
  fn failure_reported_after_all_branches() {
    let run = run_build(
      r#"<project default="main">
        <target name="main">
          <parallel>
            <fail message="left broke"/>
            <echo message="right ran"/>
          </parallel>
        </target>
      </project>"#,
    );
    assert!(run.result.unwrap_err().to_string().contains("left broke"));
    assert!(run.recorder.has_message(MessageLevel::Info, "right ran"));
  }
}
