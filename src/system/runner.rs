//! Command execution seam
//!
//! Every init-system, package-manager and network command goes through
//! [`CommandRunner`] so the supervisor variants and the provisioner can be
//! exercised without touching the host.

use std::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout and stderr joined, for matching diagnostics
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Short human readable failure description
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        let detail = if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        };
        match self.code {
            Some(code) if detail.is_empty() => format!("exit status {code}"),
            Some(code) => format!("exit status {code}: {detail}"),
            None => format!("terminated by signal: {detail}"),
        }
    }
}

/// Runs external programs
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Check whether `program` can be found on PATH
    fn command_exists(&self, program: &str) -> bool;

    /// Run and turn a non-zero exit status into an error
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(program, args)?;
        if output.success {
            Ok(output)
        } else {
            Err(Error::command(
                command_line(program, args),
                output.failure_message(),
            ))
        }
    }
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!(command = %command_line(program, args), "running command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::command(command_line(program, args), e.to_string()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn command_exists(&self, program: &str) -> bool {
        Command::new("which")
            .arg(program)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

/// Render a command line for messages
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}
