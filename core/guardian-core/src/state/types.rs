//! Serialized gate record shared by the gate runner (writer) and the
//! admission guard (reader).
//!
//! The record has no expiry of its own. Freshness is always judged by the
//! reader against its current `gateFreshnessMinutes`, so tightening the window
//! invalidates old passes without rewriting the file.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::config::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateResult {
    Passed,
    Bypassed,
}

impl GateResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Bypassed => "bypassed",
        }
    }
}

/// On-disk shape of `state.json`.
///
/// `require_mutation` and `coverage_summary_path` echo the policy a pass was
/// recorded under; bypass records omit them. Only `last_gate_passed_at` decides
/// freshness, so the other fields read as `None` when malformed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_gate_passed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_result: Option<GateResult>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub require_mutation: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub coverage_summary_path: Option<String>,
}

impl GateRecord {
    pub fn passed(at: DateTime<Utc>, require_mutation: bool, coverage_summary_path: &str) -> Self {
        Self {
            last_gate_passed_at: Some(at.trunc_subsecs(3)),
            last_result: Some(GateResult::Passed),
            require_mutation: Some(require_mutation),
            coverage_summary_path: Some(coverage_summary_path.to_string()),
        }
    }

    pub fn bypassed(at: DateTime<Utc>) -> Self {
        Self {
            last_gate_passed_at: Some(at.trunc_subsecs(3)),
            last_result: Some(GateResult::Bypassed),
            require_mutation: None,
            coverage_summary_path: None,
        }
    }

    /// Minutes elapsed since the recorded pass, or `None` if there is none.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_gate_passed_at.map(|passed_at| {
            now.signed_duration_since(passed_at).num_milliseconds() as f64 / 60_000.0
        })
    }

    /// Fresh iff a pass is recorded and its age is within the window (inclusive).
    pub fn is_fresh(&self, now: DateTime<Utc>, window_minutes: f64) -> bool {
        self.age_minutes(now)
            .is_some_and(|age| age <= window_minutes)
    }
}
