//! lumidb e2e - golden-file test harness for the lumidb CLI
//!
//! This library parses txtar archives of query/golden pairs, runs the
//! queries through the externally built database binary and reports which
//! archives produce the expected output.

pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{Harness, Outcome, Registry, RunOptions};
