//! TaskCompleted hook: runs the quality gate pipeline.
//!
//! A malformed payload is treated as `{}`, so the gate still runs against
//! the process working directory.

use tdd_guardian_core::config::process_env;
use tdd_guardian_core::gate::{GatePipeline, ShellRunner};
use tdd_guardian_core::StorageConfig;
use tdd_guardian_protocol::{parse_payload, TaskCompletedInput};

use crate::framing::{self, HookError};

pub fn run() -> Result<(), HookError> {
    let raw = framing::read_stdin().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Treating unreadable TaskCompleted payload as empty");
        String::new()
    });
    let input = parse_payload::<TaskCompletedInput>(&raw).unwrap_or_default();

    let storage = StorageConfig::from_cwd(input.cwd());
    tracing::debug!(project = %storage.project_root().display(), "Running quality gate");

    let outcome = GatePipeline::new(&storage, &ShellRunner, &process_env).run();
    match outcome.to_output() {
        Some(output) => framing::emit(&output),
        None => Ok(()),
    }
}
