//! Structured external process invocations
//!
//! Commands are built as a program plus an argument vector and never pass
//! through a shell, so environment names and user arguments cannot inject
//! shell syntax.

use crate::error::{ParityError, Result};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use tokio::process::Command;
use tokio::signal;
use tracing::debug;

/// An external program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build a spec from a `[program, args...]` vector, e.g. a hook command
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Quote an argument for display so logged commands can be pasted into a shell
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Exit status of a finished process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl ExitReport {
    /// A successful exit
    pub const SUCCESS: Self = Self { code: Some(0) };

    /// Whether the process exited with code 0
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Exit status and standard output of a captured process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit status
    pub status: ExitReport,
    /// Standard output, lossily decoded
    pub stdout: String,
}

/// Runs external commands.
///
/// The production implementation is [`SystemRunner`]; tests substitute a
/// recorder.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio and wait for it to exit
    async fn status(&self, spec: &CommandSpec) -> Result<ExitReport>;

    /// Run with captured stdout (stderr still goes to the terminal)
    async fn output(&self, spec: &CommandSpec) -> Result<CapturedOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::inherit());
        command
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> ParityError {
        ParityError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

/// Await a child process while ignoring Ctrl-C.
///
/// The child shares our terminal and receives the interrupt itself; we keep
/// waiting for it instead of dying underneath an interactive session.
async fn wait_through_interrupts<F: Future>(program: &str, child: F) -> F::Output {
    tokio::pin!(child);
    loop {
        tokio::select! {
            result = &mut child => return result,
            _ = signal::ctrl_c() => {
                debug!("Interrupt received while `{}` is running", program);
            }
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn status(&self, spec: &CommandSpec) -> Result<ExitReport> {
        debug!("Spawning: {}", spec);
        let mut child = Self::command(spec)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Self::spawn_error(spec, e))?;

        let status = wait_through_interrupts(&spec.program, child.wait()).await?;
        Ok(ExitReport {
            code: status.code(),
        })
    }

    async fn output(&self, spec: &CommandSpec) -> Result<CapturedOutput> {
        debug!("Capturing: {}", spec);
        let mut command = Self::command(spec);
        command.stderr(Stdio::inherit());
        let output = wait_through_interrupts(&spec.program, command.output())
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok(CapturedOutput {
            status: ExitReport {
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
