//! External-tool invocation: build command lines and run them as subprocesses.
//!
//! Tools are treated as opaque black boxes. The orchestrator only ever looks
//! at the exit code and the merged output lines, and those only for the
//! attempt log; success is decided later by scanning the output directory.
//!
//! Processes are spawned through the [`CommandRunner`] trait so that the
//! orchestrator can be driven by a scripted runner in tests, or wrapped by a
//! caller that wants to sandbox or audit every invocation.

use crate::pipeline::attempt::NO_EXIT_CODE;
use futures::future::BoxFuture;
use std::borrow::Cow;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// A program plus its argument vector. No shell is involved when running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        let s = path.to_string_lossy().into_owned();
        self.arg(s)
    }

    /// Shell-quoted rendering used in the attempt log, e.g.
    /// `unoconv -f pdf -o '/srv/slides/a b/a b.pdf' /srv/uploads/deck.pptx 2>&1`.
    ///
    /// The trailing `2>&1` marks that the captured output merges stdout and
    /// stderr; the process is not actually run through a shell.
    pub fn command_line(&self) -> String {
        let mut line = shell_quote(&self.program).into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line.push_str(" 2>&1");
        line
    }
}

/// Quote an argument for display if it contains anything a POSIX shell would
/// interpret.
pub fn shell_quote(arg: &str) -> Cow<'_, str> {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_./%=:,+@-".contains(c));
    if safe {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

/// What came back from one subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub lines: Vec<String>,
}

impl ToolOutput {
    pub fn new(exit_code: i32, lines: Vec<String>) -> Self {
        Self { exit_code, lines }
    }
}

/// Runs a [`ToolInvocation`] to completion.
///
/// Implementations never fail: a tool that cannot be started, is killed, or
/// overruns `timeout` is reported as a [`ToolOutput`] with exit code
/// [`NO_EXIT_CODE`] and an explanatory line, so the fallback chain can carry
/// on and the attempt still lands in the log.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
        timeout: Option<Duration>,
    ) -> BoxFuture<'a, ToolOutput>;
}

/// The default runner: spawns real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a ToolInvocation,
        timeout: Option<Duration>,
    ) -> BoxFuture<'a, ToolOutput> {
        Box::pin(run_process(invocation, timeout))
    }
}

async fn run_process(invocation: &ToolInvocation, timeout: Option<Duration>) -> ToolOutput {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to start '{}': {}", invocation.program, e);
            return ToolOutput::new(
                NO_EXIT_CODE,
                vec![format!("failed to start '{}': {}", invocation.program, e)],
            );
        }
    };

    // Dropping the wait future on timeout drops the child, and
    // kill_on_drop reaps it.
    let waited = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "'{}' timed out after {}s",
                    invocation.program,
                    limit.as_secs()
                );
                return ToolOutput::new(
                    NO_EXIT_CODE,
                    vec![format!("timed out after {}s", limit.as_secs())],
                );
            }
        },
        None => child.wait_with_output().await,
    };

    match waited {
        Ok(output) => {
            let exit_code = output.status.code().unwrap_or(NO_EXIT_CODE);
            let mut lines = split_lines(&output.stdout);
            lines.extend(split_lines(&output.stderr));
            debug!(
                "'{}' exited with {} ({} output lines)",
                invocation.program,
                exit_code,
                lines.len()
            );
            ToolOutput::new(exit_code, lines)
        }
        Err(e) => ToolOutput::new(
            NO_EXIT_CODE,
            vec![format!("failed waiting for '{}': {}", invocation.program, e)],
        ),
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}
