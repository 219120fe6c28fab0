//! tack-lib: an XML-driven build engine.
//!
//! A build file declares targets made of tasks. This crate provides:
//! - `Project`: the targets, references, properties and task registry of a build
//! - `PropertyStore`: immutable-once-set properties with thread-local scopes
//! - `EventBus`: build, target, task and message events for listeners
//! - `ProjectParser`: streaming construction of a project from markup
//! - `Executor`: dependency-ordered target execution with lazy task configuration

pub mod consts;
pub mod error;
pub mod event;
pub mod execute;
pub mod graph;
pub mod model;
pub mod parse;
pub mod property;
pub mod task;
pub mod util;

pub use error::BuildError;
pub use event::{BuildEvent, BuildListener, EventBus, MessageLevel};
pub use execute::{ExecuteConfig, ExecuteError, Executor, FailurePolicy, run_build};
pub use model::{Location, Project, Target, TaskDescriptor};
pub use parse::{ParseError, ProjectParser};
pub use property::PropertyStore;
