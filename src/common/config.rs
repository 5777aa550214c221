//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::logging::LogStyle;
use super::paths::{config_path, local_config_path};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// The database binary under test
    #[serde(default)]
    pub binary: BinaryConfig,

    /// Suite discovery and archive parsing
    #[serde(default)]
    pub suite: SuiteConfig,

    /// Host directive (`CMD `) handling
    #[serde(default)]
    pub directives: DirectiveConfig,

    /// Diff rendering
    #[serde(default)]
    pub diff: DiffConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the binary under test
#[derive(Debug, Deserialize, Clone)]
pub struct BinaryConfig {
    /// Path to the database executable
    #[serde(default = "default_binary")]
    pub path: PathBuf,

    /// Treat a non-zero exit of the binary as a hard error
    #[serde(default = "default_true")]
    pub check_exit: bool,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        Self {
            path: default_binary(),
            check_exit: true,
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("./build/lumidb")
}

fn default_true() -> bool {
    true
}

/// Suite settings
#[derive(Debug, Deserialize, Clone)]
pub struct SuiteConfig {
    /// Directory holding `*.txtar` archives
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Skip blank lines while parsing archives
    #[serde(default = "default_true")]
    pub strip_blank_lines: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            strip_blank_lines: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("e2e/data")
}

/// What to do when a host directive exits non-zero
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveFailure {
    /// Abort the unit with a command execution error
    #[default]
    Fail,
    /// Log a warning and keep going
    Ignore,
}

/// Host directive settings
#[derive(Debug, Deserialize, Clone)]
pub struct DirectiveConfig {
    /// Command interpreter used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub on_failure: DirectiveFailure,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            on_failure: DirectiveFailure::default(),
        }
    }
}

fn default_shell() -> String {
    "sh".to_string()
}

/// Diff rendering settings
#[derive(Debug, Deserialize, Clone)]
pub struct DiffConfig {
    /// Program invoked as `<program> -u - <expected-file>`
    #[serde(default = "default_diff")]
    pub program: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            program: default_diff(),
        }
    }
}

fn default_diff() -> String {
    "diff".to_string()
}

/// Timeout settings in seconds; unset means wait forever
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct Timeouts {
    /// Limit for one invocation of the binary under test
    pub query_secs: Option<u64>,

    /// Limit for one host directive
    pub directive_secs: Option<u64>,
}

/// Log output settings
#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct LoggingConfig {
    #[serde(default)]
    pub style: LogStyle,
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `./e2e.toml` is tried, then
    /// the per-user config file, and defaults are returned if neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = local_config_path();
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_layout() {
        let config = Config::default();
        assert_eq!(config.binary.path, PathBuf::from("./build/lumidb"));
        assert!(config.binary.check_exit);
        assert_eq!(config.suite.data_dir, PathBuf::from("e2e/data"));
        assert!(config.suite.strip_blank_lines);
        assert_eq!(config.directives.on_failure, DirectiveFailure::Fail);
        assert!(config.timeouts.query_secs.is_none());
        assert_eq!(config.logging.style, LogStyle::Colored);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [binary]
            path = "/opt/lumidb/bin/lumidb"

            [directives]
            on_failure = "ignore"

            [timeouts]
            query_secs = 30

            [logging]
            style = "plain"
            "#,
        )
        .unwrap();

        assert_eq!(config.binary.path, PathBuf::from("/opt/lumidb/bin/lumidb"));
        assert!(config.binary.check_exit);
        assert_eq!(config.directives.shell, "sh");
        assert_eq!(config.directives.on_failure, DirectiveFailure::Ignore);
        assert_eq!(config.timeouts.query_secs, Some(30));
        assert_eq!(config.timeouts.directive_secs, None);
        assert_eq!(config.logging.style, LogStyle::Plain);
    }

    #[test]
    fn test_parse_rejects_unknown_style() {
        let err = Config::parse("[logging]\nstyle = \"fancy\"\n").unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, super::super::Error::FileRead { .. }));
    }
}
