//! End-to-end tests driving build files through parsing and execution.

mod common;

mod execute_tests;
mod import_tests;
mod listener_tests;
mod property_tests;
