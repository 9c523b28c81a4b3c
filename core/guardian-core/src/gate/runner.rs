//! Shell execution for gate stages.
//!
//! Each stage command runs through the platform shell in the project
//! directory and blocks until it exits. No timeout is applied; the command
//! (or the host agent) is responsible for bounding its own runtime.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::GuardianError;

/// Result of one stage command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Trimmed stdout, then stderr on its own line when present.
    pub output: String,
}

impl CommandOutput {
    pub fn new(success: bool, output: impl Into<String>) -> Self {
        Self {
            success,
            output: output.into(),
        }
    }
}

/// Runs stage commands. The pipeline only sees this seam, so tests can
/// script outcomes without a shell.
pub trait CommandRunner {
    fn run(&self, command: &str, cwd: &Path) -> CommandOutput;
}

/// Runs commands via `sh -c` (Unix) or `cmd /C` (Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, cwd: &Path) -> CommandOutput {
        tracing::debug!(command, cwd = %cwd.display(), "Running gate command");

        let result = shell_command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output();

        match result {
            Ok(output) => {
                let combined = combine_output(&output.stdout, &output.stderr);
                if !output.status.success() {
                    tracing::debug!(command, status = ?output.status.code(), "Gate command failed");
                }
                CommandOutput::new(output.status.success(), combined)
            }
            Err(source) => {
                let err = GuardianError::CommandSpawn {
                    command: command.to_string(),
                    source,
                };
                tracing::warn!(error = %err, "Gate command could not start");
                CommandOutput::new(false, err.to_string())
            }
        }
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();

    let mut combined = stdout.trim().to_string();
    if !stderr.is_empty() {
        combined.push('\n');
        combined.push_str(stderr);
    }
    combined.trim().to_string()
}
