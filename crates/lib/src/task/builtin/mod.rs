//! Core tasks that only use engine services.

mod echo;
mod fail;
mod local;
mod parallel;
mod property;
mod sequential;

pub use echo::Echo;
pub use fail::Fail;
pub use local::Local;
pub use parallel::Parallel;
pub use property::PropertyTask;
pub use sequential::Sequential;

use super::TaskRegistry;

/// Register every built-in task.
pub fn register_all(registry: &mut TaskRegistry) {
  registry.register(echo::schema(), || Box::new(Echo::default()));
  registry.register(fail::schema(), || Box::new(Fail::default()));
  registry.register(local::schema(), || Box::new(Local::default()));
  registry.register(parallel::schema(), || Box::new(Parallel::default()));
  registry.register(property::schema(), || Box::new(PropertyTask::default()));
  registry.register(sequential::schema(), || Box::new(Sequential::default()));
}
