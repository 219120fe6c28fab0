//! Target and task execution.
//!
//! This module provides the [`Executor`], which drives a parsed [`Project`]:
//! - dependency ordering of the requested targets
//! - `if`/`unless` evaluation and a local property scope per target
//! - lazy configuration of each task right before it runs
//! - build, target and task events around every step
//! - failure handling according to the [`FailurePolicy`]

pub mod configure;
pub mod types;

use std::collections::HashSet;
use std::error::Error as StdError;
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::BuildError;
use crate::event::{BuildEvent, Cause, MessageLevel, MessageSource};
use crate::graph::GraphError;
use crate::model::{Project, Target, TaskDescriptor};
use crate::parse;
use crate::task::{ConfigError, TaskContext, TaskError};

pub use types::{ExecuteConfig, ExecuteError, FailedDependency, FailurePolicy, RunReport};

fn as_cause<E: StdError + Send + Sync + 'static>(result: &Result<(), E>) -> Cause<'_> {
  result.as_ref().err().map(|err| err as &(dyn StdError + Send + Sync + 'static))
}

/// Runs targets and tasks of a project.
#[derive(Debug, Clone, Copy)]
pub struct Executor<'p> {
  project: &'p Project,
  config: ExecuteConfig,
}

impl<'p> Executor<'p> {
  pub fn new(project: &'p Project) -> Self {
    Self::with_config(project, ExecuteConfig::default())
  }

  pub fn with_config(project: &'p Project, config: ExecuteConfig) -> Self {
    Self { project, config }
  }

  pub fn project(&self) -> &'p Project {
    self.project
  }

  pub fn config(&self) -> &ExecuteConfig {
    &self.config
  }

  /// Run `requested` (or the default target) between `BuildStarted` and
  /// `BuildFinished` events.
  pub fn execute<S: AsRef<str>>(&self, requested: &[S]) -> Result<(), ExecuteError> {
    self.publish(&BuildEvent::BuildStarted)?;
    let result = self.execute_targets(requested);
    let published = self.publish(&BuildEvent::BuildFinished {
      cause: as_cause(&result),
    });
    result?;
    published
  }

  /// Run `requested` (or the default target) without build events.
  pub fn execute_targets<S: AsRef<str>>(&self, requested: &[S]) -> Result<(), ExecuteError> {
    let names: Vec<&str> = if requested.is_empty() {
      match self.project.default_target() {
        Some(default) => vec![default],
        None => return Err(ExecuteError::NoTargetRequested),
      }
    } else {
      requested.iter().map(|name| name.as_ref()).collect()
    };

    let (order, unresolved) = match self.config.failure_policy {
      FailurePolicy::Halt => (self.project.resolve_execution_order(names.as_slice())?, 0),
      FailurePolicy::KeepGoing => self.resolve_each(&names)?,
    };
    info!(
      targets = ?names,
      order = ?order.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
      "executing targets"
    );

    let report = self.run_targets(&order)?;
    match report.failed.len() + unresolved {
      0 => Ok(()),
      count => Err(ExecuteError::Failed { count }),
    }
  }

  /// Resolve each requested target on its own and merge the orders.
  ///
  /// A requested target with an unknown name or a missing dependency is
  /// reported as failed and left out, so the other requested targets still
  /// run. Cycles abort before anything runs. Returns the merged order and
  /// the number of targets that could not be resolved.
  fn resolve_each(&self, names: &[&str]) -> Result<(Vec<&'p Target>, usize), ExecuteError> {
    let mut order: Vec<&'p Target> = Vec::new();
    let mut seen: HashSet<&'p str> = HashSet::new();
    let mut unresolved = 0;

    for name in names {
      match self.project.resolve_execution_order(&[*name]) {
        Ok(branch) => {
          for target in branch {
            if seen.insert(target.name.as_str()) {
              order.push(target);
            }
          }
        }
        Err(err @ GraphError::CyclicDependency { .. }) => return Err(err.into()),
        Err(err) => {
          error!(target = %name, error = %err, "target cannot be resolved");
          self.log(
            MessageSource::Project,
            MessageLevel::Error,
            &format!("Target '{name}' failed with message '{err}'."),
          )?;
          unresolved += 1;
        }
      }
    }
    Ok((order, unresolved))
  }

  /// Run targets in the given order.
  ///
  /// With [`FailurePolicy::Halt`] the first failure is returned as an error.
  /// With [`FailurePolicy::KeepGoing`] failures are recorded in the report,
  /// and targets depending on a failed or skipped target are skipped.
  pub fn run_targets(&self, order: &[&Target]) -> Result<RunReport, ExecuteError> {
    let mut report = RunReport::default();
    let mut blocked: HashSet<&str> = HashSet::new();

    for target in order {
      if let Some(dependency) = target.depends.iter().find(|dep| blocked.contains(dep.as_str())) {
        let skip = FailedDependency {
          target: target.name.clone(),
          dependency: dependency.clone(),
        };
        warn!(target = %skip.target, dependency = %skip.dependency, "skipping target");
        self.log(MessageSource::Project, MessageLevel::Error, &skip.to_string())?;
        blocked.insert(&target.name);
        report.skipped.push(skip);
        continue;
      }

      match self.run_target(target) {
        Ok(()) => report.completed.push(target.name.clone()),
        Err(err) => match self.config.failure_policy {
          FailurePolicy::Halt => return Err(err),
          FailurePolicy::KeepGoing => {
            error!(target = %target.name, error = %err, "target failed");
            self.log(
              MessageSource::Project,
              MessageLevel::Error,
              &format!("Target '{}' failed with message '{}'.", target.name, err.message()),
            )?;
            blocked.insert(&target.name);
            report.failed.push((target.name.clone(), err));
          }
        },
      }
    }

    debug!(
      completed = report.completed.len(),
      failed = report.failed.len(),
      skipped = report.skipped.len(),
      "target run finished"
    );
    Ok(report)
  }

  /// Run a single target, without its dependencies.
  pub fn run_target(&self, target: &Target) -> Result<(), ExecuteError> {
    self.publish(&BuildEvent::TargetStarted { target })?;
    let result = self.perform_target(target);
    let published = self.publish(&BuildEvent::TargetFinished {
      target,
      cause: as_cause(&result),
    });
    result?;
    published
  }

  fn perform_target(&self, target: &Target) -> Result<(), ExecuteError> {
    let properties = self.project.properties();
    let _scope = properties.scope();

    if let Some(reason) = target.skip_reason(properties)? {
      debug!(target = %target.name, %reason, "target skipped");
      self.log(MessageSource::Target(&target.name), MessageLevel::Verbose, &reason)?;
      return Ok(());
    }

    for task in &target.tasks {
      self.run_task(task)?;
    }
    Ok(())
  }

  /// Run the tasks declared directly under `project`.
  ///
  /// No target events are fired for the implicit target.
  pub fn run_implicit(&self) -> Result<(), ExecuteError> {
    let _scope = self.project.properties().scope();
    for task in &self.project.implicit_target().tasks {
      self.run_task(task)?;
    }
    Ok(())
  }

  /// Configure and run one task between `TaskStarted` and `TaskFinished`.
  pub fn run_task(&self, task: &TaskDescriptor) -> Result<(), ExecuteError> {
    self.publish(&BuildEvent::TaskStarted { task })?;
    let result = self.perform_task(task);
    let published = self.publish(&BuildEvent::TaskFinished {
      task,
      cause: as_cause(&result),
    });
    result?;
    published
  }

  fn perform_task(&self, descriptor: &TaskDescriptor) -> Result<(), ExecuteError> {
    let configuration = |source: ConfigError| ExecuteError::Configuration {
      task: descriptor.name.clone(),
      location: descriptor.location.clone(),
      source,
    };

    let factory = self
      .project
      .registry()
      .get(&descriptor.name)
      .ok_or_else(|| configuration(ConfigError::UnknownTask(descriptor.name.clone())))?;
    let mut task = configure::bind(descriptor, factory, self.project.properties()).map_err(configuration)?;

    let label = task.display_name().unwrap_or(&descriptor.name).to_string();
    debug!(task = %label, target = %descriptor.owning_target, "executing task");

    let ctx = TaskContext::new(self, descriptor, &label);
    task.execute(&ctx).map_err(|err| match err {
      TaskError::Nested(inner) => *inner,
      other => ExecuteError::TaskExecution {
        task: label.clone(),
        location: descriptor.location.clone(),
        source: other,
      },
    })
  }

  fn publish(&self, event: &BuildEvent<'_>) -> Result<(), ExecuteError> {
    self.project.bus().publish(event)?;
    Ok(())
  }

  fn log(&self, source: MessageSource<'_>, level: MessageLevel, text: &str) -> Result<(), ExecuteError> {
    self.project.bus().message(source, level, text)?;
    Ok(())
  }
}

/// Parse `file` into `project` and run `targets`, all between one pair of
/// `BuildStarted`/`BuildFinished` events.
pub fn run_build<S: AsRef<str>>(
  project: &mut Project,
  file: &Path,
  targets: &[S],
  config: ExecuteConfig,
) -> Result<(), BuildError> {
  project.bus().publish(&BuildEvent::BuildStarted).map_err(ExecuteError::from)?;

  let result = match parse::configure_project(project, file) {
    Ok(()) => Executor::with_config(project, config)
      .execute_targets(targets)
      .map_err(BuildError::from),
    Err(err) => Err(err),
  };

  let published = project.bus().publish(&BuildEvent::BuildFinished {
    cause: as_cause(&result),
  });
  result?;
  published.map_err(ExecuteError::from)?;
  Ok(())
}
