//! Golden comparison and diff rendering

use std::path::PathBuf;
use std::process::Stdio;

use colored::Colorize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::common::logging::LogStyle;
use crate::common::{Error, Result};

/// Result of comparing actual output against a golden
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub has_difference: bool,
    /// Unified diff, empty when nothing differs
    pub rendered: String,
}

/// Compares actual output with expected text and renders diffs
#[derive(Debug, Clone)]
pub struct GoldenComparator {
    program: String,
    style: LogStyle,
}

impl GoldenComparator {
    pub fn new(program: impl Into<String>, style: LogStyle) -> Self {
        Self {
            program: program.into(),
            style,
        }
    }

    /// Compare and print the rendered diff, returning whether they differ
    pub async fn diff(&self, expected: &str, actual: &str) -> Result<bool> {
        let comparison = self.compare(expected, actual).await?;
        if comparison.has_difference {
            self.print_rendered(&comparison.rendered);
        }
        Ok(comparison.has_difference)
    }

    /// Print a rendered diff to stderr, colored in `LogStyle::Colored`
    pub fn print_rendered(&self, rendered: &str) {
        if self.style.is_colored() {
            eprint!("{}", paint(rendered));
        } else {
            eprint!("{}", rendered);
        }
    }

    /// Compare `actual` against the normalized `expected` text
    pub async fn compare(&self, expected: &str, actual: &str) -> Result<Comparison> {
        let expected = normalize(expected);
        if expected == actual {
            return Ok(Comparison {
                has_difference: false,
                rendered: String::new(),
            });
        }

        let rendered = self.render(&expected, actual).await?;
        Ok(Comparison {
            has_difference: true,
            rendered,
        })
    }

    /// Render a plain unified diff with actual as the old side
    ///
    /// Expected text goes through a temporary file that is removed when it
    /// drops, on every return path.
    async fn render(&self, expected: &str, actual: &str) -> Result<String> {
        let program = self.resolve_program()?;

        let expected_file = tempfile::Builder::new()
            .prefix("golden-")
            .suffix(".txt")
            .tempfile()?;
        tokio::fs::write(expected_file.path(), expected).await?;

        let mut child = Command::new(&program)
            .arg("-u")
            .args(["--label", "actual", "--label", "expected"])
            .arg("-")
            .arg(expected_file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandExecution {
                command: self.program.clone(),
                exit_code: None,
                stderr: format!("failed to spawn: {}", e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::orchestration("diff stdin was not captured"))?;
        let input = actual.as_bytes().to_vec();
        let feed = async move {
            let written = stdin.write_all(&input).await;
            drop(stdin);
            written
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;

        // diff exits 1 when inputs differ, anything above means trouble
        match output.status.code() {
            Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
            code => Err(Error::command_failed(&self.program, code, &output.stderr)),
        }
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|e| {
            Error::Config(format!("diff program '{}' not found: {}", self.program, e))
        })
    }
}

/// Collapse trailing line breaks to exactly one
///
/// Blank text becomes a lone `\n`, so an archive that selects no cases
/// still differs from empty output.
pub fn normalize(text: &str) -> String {
    format!("{}\n", text.trim_end_matches('\n'))
}

/// Color the lines of a unified diff
fn paint(rendered: &str) -> String {
    let mut out = String::with_capacity(rendered.len());
    for line in rendered.lines() {
        let painted = if line.starts_with("---") || line.starts_with("+++") {
            line.bold().to_string()
        } else if line.starts_with("@@") {
            line.cyan().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else if line.starts_with('+') {
            line.green().to_string()
        } else {
            line.to_string()
        };
        out.push_str(&painted);
        out.push('\n');
    }
    out
}

/// Dump raw actual and expected text to stderr ahead of a comparison
pub fn print_debug(actual: &str, expected: &str) {
    eprintln!("{}", "--- got ---".yellow());
    eprintln!("{}", actual);
    eprintln!("{}", "--- expected ---".yellow());
    eprintln!("{}", expected);
}
