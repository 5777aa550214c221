//! Query replay against the binary under test
//!
//! Query text is cut into batches at `CMD ` directive lines. Each batch is
//! piped to one invocation of the binary and its stdout is collected; each
//! directive runs through the host shell in between, with its output
//! discarded. Everything runs strictly in order.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::common::config::{Config, DirectiveFailure};
use crate::common::{Error, Result};

use super::case::{is_directive, DIRECTIVE_PREFIX};

/// Replays query streams against an external binary
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    binary: PathBuf,
    check_exit: bool,
    shell: String,
    on_directive_failure: DirectiveFailure,
    query_timeout: Option<Duration>,
    directive_timeout: Option<Duration>,
}

impl QueryExecutor {
    /// Executor for `binary` with the default shell and no timeouts
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            check_exit: true,
            shell: "sh".to_string(),
            on_directive_failure: DirectiveFailure::Fail,
            query_timeout: None,
            directive_timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            binary: config.binary.path.clone(),
            check_exit: config.binary.check_exit,
            shell: config.directives.shell.clone(),
            on_directive_failure: config.directives.on_failure,
            query_timeout: config.timeouts.query_secs.map(Duration::from_secs),
            directive_timeout: config.timeouts.directive_secs.map(Duration::from_secs),
        }
    }

    /// Whether a non-zero exit of the binary is a hard error
    pub fn with_check_exit(mut self, check_exit: bool) -> Self {
        self.check_exit = check_exit;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_directive_failure(mut self, policy: DirectiveFailure) -> Self {
        self.on_directive_failure = policy;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_directive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.directive_timeout = timeout;
        self
    }

    /// Replay `query` and return the concatenated stdout of every batch
    pub async fn execute(&self, query: &str) -> Result<String> {
        let mut out = String::new();
        let mut batch: Vec<&str> = Vec::new();
        let mut batches = 0usize;

        for line in query.lines() {
            if is_directive(line) {
                if !batch.is_empty() {
                    out.push_str(&self.run_batch(&batch).await?);
                    batches += 1;
                    batch.clear();
                }
                self.run_directive(&line[DIRECTIVE_PREFIX.len()..]).await?;
            } else {
                batch.push(line);
            }
        }

        if !batch.is_empty() {
            out.push_str(&self.run_batch(&batch).await?);
            batches += 1;
        }

        tracing::debug!(batches, bytes = out.len(), "query stream replayed");
        Ok(out)
    }

    /// Pipe one batch to a fresh invocation of the binary
    async fn run_batch(&self, lines: &[&str]) -> Result<String> {
        let mut input = lines.join("\n");
        input.push('\n');

        let label = self.binary.display().to_string();
        tracing::debug!(lines = lines.len(), "running batch through {}", label);

        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandExecution {
                command: label.clone(),
                exit_code: None,
                stderr: format!("failed to spawn: {}", e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::orchestration("child stdin was not captured"))?;

        let feed = async move {
            let written = stdin.write_all(input.as_bytes()).await;
            drop(stdin);
            match written {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            }
        };

        let (fed, output) = with_timeout(&label, self.query_timeout, async {
            Ok(tokio::join!(feed, child.wait_with_output()))
        })
        .await?;
        let output = output?;
        fed?;

        if self.check_exit && !output.status.success() {
            return Err(Error::command_failed(
                &label,
                output.status.code(),
                &output.stderr,
            ));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            Error::orchestration(format!("{} wrote non UTF-8 output: {}", label, e))
        })
    }

    /// Run a host directive through the shell, discarding its output
    async fn run_directive(&self, command: &str) -> Result<()> {
        tracing::debug!("directive: {}", command);

        let output: Output = with_timeout(command, self.directive_timeout, async {
            Command::new(&self.shell)
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(Error::from)
        })
        .await?;

        if output.status.success() {
            return Ok(());
        }

        match self.on_directive_failure {
            DirectiveFailure::Fail => Err(Error::command_failed(
                command,
                output.status.code(),
                &output.stderr,
            )),
            DirectiveFailure::Ignore => {
                tracing::warn!(
                    "directive '{}' exited with {:?}, continuing",
                    command,
                    output.status.code()
                );
                Ok(())
            }
        }
    }
}

/// Await `fut`, bounded by `limit` when one is set
async fn with_timeout<T, F>(command: &str, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout {
                command: command.to_string(),
                limit,
            })?,
        None => fut.await,
    }
}
