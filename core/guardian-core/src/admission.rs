//! Admission guard for the PreToolUse hook.
//!
//! Decides whether a proposed shell command may run. Only commands matching
//! [`crate::patterns`] are ever denied, and only for a policy reason:
//!
//! ```text
//! not Bash / empty / not sensitive      → allow
//! config missing or enabled=false        → deny (not enabled)
//! bypass env truthy                      → allow
//! blockCommitWithoutFreshGate=false      → allow
//! no pass, unparsable, or older than window → deny (stale)
//! otherwise                              → allow
//! ```
//!
//! The guard never writes config or state.

use chrono::{DateTime, Utc};
use tdd_guardian_protocol::{PreToolUseInput, PreToolUseOutput};

use crate::config::{EnvLookup, GuardianConfig};
use crate::patterns::{classify_command, SensitiveAction};
use crate::state::GateStore;
use crate::storage::StorageConfig;

pub const NOT_ENABLED_MESSAGE: &str = "TDD Guardian is not enabled. Run /tdd-guardian:init first.";
pub const STALE_GATE_MESSAGE: &str = "Blocked by TDD Guardian: quality gates are stale or missing. \
Run your gate commands (tests, coverage, mutation if enabled), then retry.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    NotBash,
    EmptyCommand,
    NotSensitive,
    Bypassed,
    FreshnessNotEnforced,
    FreshGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotEnabled,
    StaleGate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Allow(AllowReason),
    Deny { reason: DenyReason, message: String },
}

impl AdmissionDecision {
    fn deny(reason: DenyReason) -> Self {
        let message = match reason {
            DenyReason::NotEnabled => NOT_ENABLED_MESSAGE,
            DenyReason::StaleGate => STALE_GATE_MESSAGE,
        };
        Self::Deny {
            reason,
            message: message.to_string(),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// The hook document to print, or `None` for a silent allow.
    pub fn to_output(&self) -> Option<PreToolUseOutput> {
        match self {
            Self::Allow(_) => None,
            Self::Deny { message, .. } => Some(PreToolUseOutput::deny(message.clone())),
        }
    }
}

/// Evaluates a hook payload against the config and state under its `cwd`.
pub fn evaluate(
    input: &PreToolUseInput,
    env: EnvLookup<'_>,
    now: DateTime<Utc>,
) -> AdmissionDecision {
    if !input.is_bash() {
        return AdmissionDecision::Allow(AllowReason::NotBash);
    }

    let Some(command) = input.command() else {
        return AdmissionDecision::Allow(AllowReason::EmptyCommand);
    };

    let Some(action) = classify_command(command) else {
        tracing::debug!("Command not sensitive, allowing");
        return AdmissionDecision::Allow(AllowReason::NotSensitive);
    };

    let storage = StorageConfig::from_cwd(input.cwd());
    evaluate_sensitive(action, &storage, env, now)
}

/// Policy evaluation for a command already classified as sensitive.
///
/// Config and state are read here, per call, never cached.
pub fn evaluate_sensitive(
    action: SensitiveAction,
    storage: &StorageConfig,
    env: EnvLookup<'_>,
    now: DateTime<Utc>,
) -> AdmissionDecision {
    let config = GuardianConfig::load(&storage.config_file());
    if !config.enabled() {
        tracing::info!(action = action.label(), "Guardian not enabled, denying");
        return AdmissionDecision::deny(DenyReason::NotEnabled);
    }

    if config.bypass_active(env) {
        tracing::info!(
            action = action.label(),
            bypass_env = config.bypass_env(),
            "Bypass active, allowing"
        );
        return AdmissionDecision::Allow(AllowReason::Bypassed);
    }

    if !config.blocks_without_fresh_gate() {
        return AdmissionDecision::Allow(AllowReason::FreshnessNotEnforced);
    }

    let window = config.gate_freshness_minutes();
    let record = GateStore::new(&storage.state_file()).load();
    let fresh = record
        .as_ref()
        .is_some_and(|record| record.is_fresh(now, window));

    if fresh {
        AdmissionDecision::Allow(AllowReason::FreshGate)
    } else {
        tracing::info!(
            action = action.label(),
            age_minutes = ?record.and_then(|r| r.age_minutes(now)),
            window_minutes = window,
            "Gate stale or missing, denying"
        );
        AdmissionDecision::deny(DenyReason::StaleGate)
    }
}
