//! CLI argument definitions
//!
//! Defines the clap arguments for the e2e harness.

use clap::Args;
use std::path::PathBuf;

use crate::common::config::Config;
use crate::common::logging::LogStyle;
use crate::common::split_list;
use crate::testing::{IncludeFilter, RunOptions};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Comma-separated test units to run (default: every archive in the data dir)
    #[arg(long, default_value = "")]
    pub case: String,

    /// Comma-separated `.in` sections to include from each unit
    #[arg(long)]
    pub includes: Option<String>,

    /// Print raw output and expected text before diffing
    #[arg(long)]
    pub debug: bool,

    /// Log batch and directive activity
    #[arg(long, short)]
    pub verbose: bool,

    /// Print the suite summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Database binary under test (overrides config)
    #[arg(long)]
    pub binary: Option<PathBuf>,

    /// Directory holding *.txtar archives (overrides config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (default: ./e2e.toml, then the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output styling (overrides config)
    #[arg(long, value_enum)]
    pub log_style: Option<LogStyle>,
}

impl RunArgs {
    /// Unit selectors from `--case`
    pub fn selectors(&self) -> Vec<String> {
        split_list(&self.case)
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(binary) = &self.binary {
            config.binary.path = binary.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.suite.data_dir = data_dir.clone();
        }
        if let Some(style) = self.log_style {
            config.logging.style = style;
        }
    }

    pub fn run_options(&self, config: &Config) -> RunOptions {
        RunOptions {
            includes: IncludeFilter::parse(self.includes.as_deref().unwrap_or_default()),
            debug: self.debug,
            strip_blank_lines: config.suite.strip_blank_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config() {
        let args = RunArgs {
            case: "select,,insert".into(),
            includes: Some("a.in,b.in".into()),
            binary: Some(PathBuf::from("/tmp/lumidb")),
            log_style: Some(LogStyle::Plain),
            ..Default::default()
        };

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.binary.path, PathBuf::from("/tmp/lumidb"));
        assert_eq!(config.suite.data_dir, PathBuf::from("e2e/data"));
        assert_eq!(config.logging.style, LogStyle::Plain);

        assert_eq!(args.selectors(), vec!["select", "insert"]);
        let options = args.run_options(&config);
        assert!(options.includes.allows("a.in"));
        assert!(!options.includes.allows("c.in"));
        assert!(!options.debug);
    }

    #[test]
    fn test_no_includes_selects_everything() {
        let options = RunArgs::default().run_options(&Config::default());
        assert!(options.includes.is_empty());
        assert!(options.strip_blank_lines);
    }
}
