//! Test runner implementation
//!
//! Runs one archive unit end to end (parse, assemble, execute, compare) and
//! drives a whole suite of units. Per-unit failures become an `Errored`
//! outcome and never stop the suite.

use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::paths::is_archive;
use crate::common::{Error, Result};

use super::archive::Archive;
use super::case::{assemble, CombinedRun, IncludeFilter};
use super::comparator::{print_debug, GoldenComparator};
use super::executor::QueryExecutor;
use super::registry::{ArchiveUnit, Registry, TestUnit};

/// Final state of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { diff: String },
    Errored { error: String },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

/// Outcome of one named unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-run selection and observability switches
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub includes: IncludeFilter,
    /// Print raw actual and expected text before comparing
    pub debug: bool,
    pub strip_blank_lines: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            includes: IncludeFilter::default(),
            debug: false,
            strip_blank_lines: true,
        }
    }
}

/// Executor and comparator shared by every unit of a run
#[derive(Debug, Clone)]
pub struct Harness {
    executor: QueryExecutor,
    comparator: GoldenComparator,
}

impl Harness {
    pub fn new(executor: QueryExecutor, comparator: GoldenComparator) -> Self {
        Self {
            executor,
            comparator,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            QueryExecutor::from_config(config),
            GoldenComparator::new(config.diff.program.clone(), config.logging.style),
        )
    }

    /// Run the archive at `path` as unit `name`
    pub async fn run(&self, name: &str, path: &Path, options: &RunOptions) -> Outcome {
        let run = match load(path, options) {
            Ok(run) => run,
            Err(e) => {
                tracing::error!("failed to load test {}, err={}", name, e);
                return Outcome::Errored {
                    error: e.to_string(),
                };
            }
        };

        tracing::info!("test {} starting", name);
        tracing::debug!("{} cases selected in {}", run.cases.len(), name);

        match self.execute_and_compare(&run, options).await {
            Ok(outcome) => {
                match &outcome {
                    Outcome::Passed => tracing::info!("test {} ok", name),
                    _ => tracing::error!("test {} failed", name),
                }
                outcome
            }
            Err(e) => {
                tracing::error!("failed to run test {}, err={}", name, e);
                Outcome::Errored {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn execute_and_compare(&self, run: &CombinedRun, options: &RunOptions) -> Result<Outcome> {
        let actual = self.executor.execute(&run.query).await?;

        if options.debug {
            print_debug(&actual, &run.golden);
        }

        let comparison = self.comparator.compare(&run.golden, &actual).await?;
        if !comparison.has_difference {
            return Ok(Outcome::Passed);
        }

        self.comparator.print_rendered(&comparison.rendered);
        Ok(Outcome::Failed {
            diff: comparison.rendered,
        })
    }
}

/// Parse and assemble an archive without touching any subprocess
pub fn load(path: &Path, options: &RunOptions) -> Result<CombinedRun> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let archive = Archive::parse(&text, options.strip_blank_lines)?;
    assemble(&archive, &options.includes)
}

/// Reports of a whole suite run
#[derive(Debug, Default, Serialize)]
pub struct SuiteSummary {
    pub reports: Vec<UnitReport>,
}

impl SuiteSummary {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Errored { .. }))
    }

    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_passed())
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Print a per-unit table followed by totals
    pub fn print(&self) {
        if self.reports.is_empty() {
            println!("{}", "No tests selected".yellow());
            return;
        }

        println!("\n{}", "Results:".cyan());
        for report in &self.reports {
            match &report.outcome {
                Outcome::Passed => println!("  {} {}", "✓".green(), report.name),
                Outcome::Failed { .. } => {
                    println!("  {} {} {}", "✗".red(), report.name, "(diff)".dimmed())
                }
                Outcome::Errored { error } => {
                    let first_line = error.lines().next().unwrap_or_default();
                    println!("  {} {} {}", "!".red().bold(), report.name, first_line.dimmed())
                }
            }
        }

        let totals = format!(
            "{} passed, {} failed, {} errored",
            self.passed(),
            self.failed(),
            self.errored()
        );
        if self.all_passed() {
            println!("\n{}", totals.green().bold());
        } else {
            println!("\n{}", totals.red().bold());
        }
    }
}

/// Run the selected units one after another
///
/// With no selectors every registered unit runs. A selector is a registered
/// unit name or a path to an archive file; anything else is reported as an
/// errored unit and the remaining selectors still run.
pub async fn run_suite(
    harness: &Harness,
    registry: &Registry,
    selectors: &[String],
    options: &RunOptions,
) -> SuiteSummary {
    let mut summary = SuiteSummary::default();

    if selectors.is_empty() {
        for unit in registry.units() {
            summary.reports.push(run_unit(unit, harness, options).await);
        }
        return summary;
    }

    for selector in selectors {
        let report = if let Some(unit) = registry.get(selector) {
            run_unit(unit, harness, options).await
        } else if is_archive(Path::new(selector)) && Path::new(selector).is_file() {
            let unit = ArchiveUnit::from_path(Path::new(selector));
            run_unit(&unit, harness, options).await
        } else {
            tracing::error!("no such case: {}", selector);
            UnitReport {
                name: selector.clone(),
                outcome: Outcome::Errored {
                    error: Error::orchestration(format!("no such case: {}", selector))
                        .to_string(),
                },
            }
        };
        summary.reports.push(report);
    }
    summary
}

async fn run_unit(unit: &dyn TestUnit, harness: &Harness, options: &RunOptions) -> UnitReport {
    UnitReport {
        name: unit.name().to_string(),
        outcome: unit.run(harness, options).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::logging::LogStyle;

    fn write_archive(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(format!("{name}.txtar"));
        std::fs::write(&path, text).unwrap();
        path
    }

    fn harness() -> Harness {
        Harness::new(
            QueryExecutor::new("/nonexistent/lumidb"),
            GoldenComparator::new("diff", LogStyle::Plain),
        )
    }

    #[tokio::test]
    async fn test_missing_golden_errors_before_execution() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "b", "-- b.in --\nSELECT 1;\n");

        let outcome = harness().run("b", &path, &RunOptions::default()).await;
        match outcome {
            Outcome::Errored { error } => {
                assert!(error.contains("b.golden"), "{error}");
            }
            other => panic!("expected errored outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_section_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "dup", "-- a.in --\n-- a.in --\n");
        let outcome = harness().run("dup", &path, &RunOptions::default()).await;
        assert!(matches!(outcome, Outcome::Errored { .. }));
    }

    #[tokio::test]
    async fn test_execution_failure_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a", "-- a.in --\nSELECT 1;\n-- a.golden --\n1\n");
        let outcome = harness().run("a", &path, &RunOptions::default()).await;
        match outcome {
            Outcome::Errored { error } => assert!(error.contains("/nonexistent/lumidb")),
            other => panic!("expected errored outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_selector_does_not_stop_suite() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "empty", "-- notes --\nnothing here\n");
        let registry = Registry::discover(dir.path()).unwrap();

        let selectors = vec!["missing".to_string(), "empty".to_string()];
        let summary = run_suite(&harness(), &registry, &selectors, &RunOptions::default()).await;

        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.reports[0].name, "missing");
        assert!(matches!(summary.reports[0].outcome, Outcome::Errored { .. }));
        assert_eq!(summary.reports[1].name, "empty");
        assert!(!summary.reports[1].outcome.is_passed());
        assert_eq!(summary.passed(), 0);
        assert!(!summary.all_passed());
    }

    #[tokio::test]
    async fn test_archive_without_cases_does_not_pass() {
        if which::which("diff").is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "notes", "-- notes --\nnothing here\n");

        let outcome = harness().run("notes", &path, &RunOptions::default()).await;
        assert!(
            matches!(outcome, Outcome::Failed { .. }),
            "expected failed outcome, got {outcome:?}"
        );
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = SuiteSummary {
            reports: vec![
                UnitReport {
                    name: "a".into(),
                    outcome: Outcome::Passed,
                },
                UnitReport {
                    name: "b".into(),
                    outcome: Outcome::Failed {
                        diff: "-3\n+2\n".into(),
                    },
                },
            ],
        };
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["reports"][0]["status"], "passed");
        assert_eq!(value["reports"][1]["name"], "b");
        assert_eq!(value["reports"][1]["status"], "failed");
        assert_eq!(value["reports"][1]["diff"], "-3\n+2\n");
    }
}
