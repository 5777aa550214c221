//! Golden-file test harness
//!
//! Reads txtar-style archives of `.in`/`.golden` section pairs, replays the
//! inputs against the database binary and diffs the captured output against
//! the goldens.

pub mod archive;
pub mod case;
pub mod comparator;
pub mod executor;
pub mod registry;
pub mod runner;

pub use archive::{Archive, Section};
pub use case::{assemble, CombinedRun, IncludeFilter, TestCase};
pub use comparator::{Comparison, GoldenComparator};
pub use executor::QueryExecutor;
pub use registry::{ArchiveUnit, Registry, TestUnit};
pub use runner::{run_suite, Harness, Outcome, RunOptions, SuiteSummary, UnitReport};
