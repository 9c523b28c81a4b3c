//! PreToolUse hook: admission check for sensitive Bash commands.

use chrono::Utc;
use tdd_guardian_core::admission::{self, AdmissionDecision};
use tdd_guardian_core::config::process_env;
use tdd_guardian_protocol::{parse_payload, PreToolUseInput};

use crate::framing::{self, HookError};

pub fn run() -> Result<(), HookError> {
    let raw = framing::read_stdin()?;

    let Some(input) = parse_payload::<PreToolUseInput>(&raw) else {
        if !raw.trim().is_empty() {
            tracing::debug!("Unparsable PreToolUse payload, allowing");
        }
        return Ok(());
    };

    let decision = admission::evaluate(&input, &process_env, Utc::now());
    match &decision {
        AdmissionDecision::Allow(reason) => {
            tracing::debug!(reason = ?reason, "Command allowed");
        }
        AdmissionDecision::Deny { reason, .. } => {
            tracing::info!(reason = ?reason, cwd = ?input.cwd(), "Command denied");
        }
    }

    match decision.to_output() {
        Some(output) => framing::emit(&output),
        None => Ok(()),
    }
}
