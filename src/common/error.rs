//! Error types for the e2e harness
//!
//! Parse and assembly errors are raised before any subprocess is spawned.
//! Everything that goes wrong inside a single unit is turned into an
//! `Errored` outcome by the runner, so these never abort a suite run.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Archive Errors ===
    #[error("Archive parse error: duplicated section '{name}'")]
    DuplicateSection { name: String },

    #[error("Section '{input}' has no golden counterpart '{golden}'")]
    MissingGolden { input: String, golden: String },

    // === Execution Errors ===
    #[error("Command '{command}' returned non-zero exit status {}, err=\n{stderr}", exit_status(.exit_code))]
    CommandExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {limit:?}")]
    Timeout { command: String, limit: Duration },

    // === Orchestration Errors ===
    #[error("{0}")]
    Orchestration(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "(killed by signal)".to_string(),
    }
}

impl Error {
    /// Create a command execution error from a finished process
    pub fn command_failed(command: &str, exit_code: Option<i32>, stderr: &[u8]) -> Self {
        Self::CommandExecution {
            command: command.to_string(),
            exit_code,
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Create an orchestration error
    pub fn orchestration<S: Into<String>>(message: S) -> Self {
        Self::Orchestration(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_keeps_stderr() {
        let err = Error::command_failed("./build/lumidb", Some(3), b"boom\n");
        let msg = err.to_string();
        assert!(msg.contains("non-zero exit status 3"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }

    #[test]
    fn test_signal_exit_is_reported() {
        let err = Error::command_failed("sleep 10", None, b"");
        assert!(err.to_string().contains("killed by signal"));
    }

    #[test]
    fn test_timeout_reports_sub_second_limits() {
        let err = Error::Timeout {
            command: "./build/lumidb".into(),
            limit: Duration::from_millis(200),
        };
        assert_eq!(
            err.to_string(),
            "Command './build/lumidb' timed out after 200ms"
        );
    }

    #[test]
    fn test_missing_golden_names_both_sections() {
        let err = Error::MissingGolden {
            input: "b.in".into(),
            golden: "b.golden".into(),
        };
        assert_eq!(
            err.to_string(),
            "Section 'b.in' has no golden counterpart 'b.golden'"
        );
    }
}
