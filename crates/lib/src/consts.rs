//! Well-known names.

/// Build file looked up when none is given.
pub const DEFAULT_BUILD_FILE: &str = "build.xml";

/// Property holding the project base directory.
pub const BASEDIR_PROPERTY: &str = "basedir";

/// User property holding the path of the top-level build file.
pub const BUILD_FILE_PROPERTY: &str = "tack.file";

/// Prefix of the per-project build file properties (`tack.file.<project>`).
pub const PROJECT_FILE_PREFIX: &str = "tack.file.";

/// Name of the target that holds tasks declared directly under `project`.
pub const IMPLICIT_TARGET: &str = "";

/// Prefix under which `EnvironmentHook` exposes environment variables by
/// default.
pub const ENV_PREFIX: &str = "env";
