//! Logging and tracing configuration
//!
//! The harness logs unit progress to stderr. Whether output is colored is
//! decided once at startup from [`LogStyle`]; nothing probes the terminal
//! or degrades at runtime.

use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How log and report output is rendered
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogStyle {
    /// ANSI colors in logs, reports and diffs
    #[default]
    Colored,
    /// No escape sequences anywhere
    Plain,
}

impl LogStyle {
    pub fn is_colored(self) -> bool {
        self == LogStyle::Colored
    }
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG with `verbose`), WARN for
/// dependencies.
pub fn init_cli(style: LogStyle, verbose: bool) {
    let default_directive = if verbose {
        "lumidb_e2e=debug,warn"
    } else {
        "lumidb_e2e=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    apply_style(style);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(style.is_colored())
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .compact(),
        )
        .init();
}

/// Force `colored` on or off to match the chosen style
pub fn apply_style(style: LogStyle) {
    colored::control::set_override(style.is_colored());
}
