//! Running external commands and capturing their output

use crate::codepage::decode_output;
use crate::error::{PortProxyError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Exit code and captured standard output of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code, `-1` when the process ended without one
    pub exit_code: i32,

    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a program with an argument vector and waits for it to finish
///
/// Implementations must not go through a shell, and must report a program that
/// cannot be started as [`PortProxyError::Launch`].
#[allow(async_fn_in_trait)]
pub trait CommandInvoker {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

impl<T: CommandInvoker + ?Sized> CommandInvoker for &T {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).run(program, args).await
    }
}

/// Invoker backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInvoker;

impl SystemInvoker {
    pub fn new() -> Self {
        Self
    }
}

impl CommandInvoker for SystemInvoker {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        tracing::debug!("exec: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| PortProxyError::Launch {
                program: program.to_string(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if !output.stderr.is_empty() {
            tracing::debug!("{} stderr: {}", program, decode_output(&output.stderr));
        }
        tracing::debug!("exit={} stdout_len={}", exit_code, output.stdout.len());

        Ok(CommandOutput {
            exit_code,
            stdout: decode_output(&output.stdout),
        })
    }
}

/// Wraps another invoker and fails commands that run longer than a deadline
///
/// A timed-out [`SystemInvoker`] child is killed when its future is dropped.
#[derive(Debug, Clone)]
pub struct TimeoutInvoker<I> {
    inner: I,
    after: Duration,
}

impl<I: CommandInvoker> TimeoutInvoker<I> {
    pub fn new(inner: I, after: Duration) -> Self {
        Self { inner, after }
    }
}

impl<I: CommandInvoker> CommandInvoker for TimeoutInvoker<I> {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        tokio::time::timeout(self.after, self.inner.run(program, args))
            .await
            .map_err(|_| PortProxyError::Timeout {
                program: program.to_string(),
                after: self.after,
            })?
    }
}

/// Invoker choosing at runtime whether a deadline applies
#[derive(Debug, Clone)]
pub enum ConfiguredInvoker {
    Unbounded(SystemInvoker),
    Bounded(TimeoutInvoker<SystemInvoker>),
}

impl ConfiguredInvoker {
    pub fn new(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(after) => Self::Bounded(TimeoutInvoker::new(SystemInvoker, after)),
            None => Self::Unbounded(SystemInvoker),
        }
    }
}

impl CommandInvoker for ConfiguredInvoker {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        match self {
            Self::Unbounded(invoker) => invoker.run(program, args).await,
            Self::Bounded(invoker) => invoker.run(program, args).await,
        }
    }
}
