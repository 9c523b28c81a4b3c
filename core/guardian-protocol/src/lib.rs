//! Hook payload and decision types for TDD Guardian.
//!
//! Shared by the core library and the hook binary so the stdin/stdout schema
//! the host agent sees cannot drift between the two decision points.
//!
//! Inputs are parsed leniently: unknown fields are ignored and every field is
//! optional, because a malformed payload must degrade to "no decision" rather
//! than an error. Outputs are serialized exactly as the host expects.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const BASH_TOOL_NAME: &str = "Bash";
pub const PRE_TOOL_USE_EVENT: &str = "PreToolUse";
pub const TASK_COMPLETED_EVENT: &str = "TaskCompleted";

// ═══════════════════════════════════════════════════════════════════════════════
// Inputs
// ═══════════════════════════════════════════════════════════════════════════════

/// Payload delivered to the admission hook before a tool runs.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PreToolUseInput {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ToolInput {
    #[serde(default)]
    pub command: Option<String>,
}

impl PreToolUseInput {
    pub fn is_bash(&self) -> bool {
        self.tool_name.as_deref() == Some(BASH_TOOL_NAME)
    }

    /// The trimmed shell command, if one was supplied and is non-empty.
    pub fn command(&self) -> Option<&str> {
        self.tool_input
            .as_ref()
            .and_then(|input| input.command.as_deref())
            .map(str::trim)
            .filter(|command| !command.is_empty())
    }

    pub fn cwd(&self) -> Option<&str> {
        non_empty(self.cwd.as_deref())
    }
}

/// Payload delivered to the gate hook when a task is declared complete.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TaskCompletedInput {
    #[serde(default)]
    pub cwd: Option<String>,
}

impl TaskCompletedInput {
    pub fn cwd(&self) -> Option<&str> {
        non_empty(self.cwd.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a raw stdin payload, returning `None` for empty or malformed input.
pub fn parse_payload<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Outputs
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Deny,
}

/// Denial emitted by the admission hook. Absence of output means allow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreToolUseOutput {
    pub hook_specific_output: PreToolUseSpecific,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreToolUseSpecific {
    pub hook_event_name: String,
    pub permission_decision: PermissionDecision,
    pub permission_decision_reason: String,
}

impl PreToolUseOutput {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: PreToolUseSpecific {
                hook_event_name: PRE_TOOL_USE_EVENT.to_string(),
                permission_decision: PermissionDecision::Deny,
                permission_decision_reason: reason.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Block,
}

/// Block emitted by the gate hook. Absence of output means pass-through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletedOutput {
    pub decision: Decision,
    pub reason: String,
    pub hook_specific_output: TaskCompletedSpecific,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletedSpecific {
    pub hook_event_name: String,
    pub additional_context: String,
}

impl TaskCompletedOutput {
    pub fn block(reason: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            decision: Decision::Block,
            reason: reason.into(),
            hook_specific_output: TaskCompletedSpecific {
                hook_event_name: TASK_COMPLETED_EVENT.to_string(),
                additional_context: context.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bash_payload() {
        let input: PreToolUseInput = parse_payload(
            r#"{"tool_name":"Bash","tool_input":{"command":"  git push  "},"cwd":"/repo","session_id":"abc"}"#,
        )
        .unwrap();
        assert!(input.is_bash());
        assert_eq!(input.command(), Some("git push"));
        assert_eq!(input.cwd(), Some("/repo"));
    }

    #[test]
    fn blank_command_is_none() {
        let input: PreToolUseInput =
            parse_payload(r#"{"tool_name":"Bash","tool_input":{"command":"   "}}"#).unwrap();
        assert_eq!(input.command(), None);
    }

    #[test]
    fn missing_tool_input_is_tolerated() {
        let input: PreToolUseInput = parse_payload(r#"{"tool_name":"Read"}"#).unwrap();
        assert!(!input.is_bash());
        assert_eq!(input.command(), None);
        assert_eq!(input.cwd(), None);
    }

    #[test]
    fn empty_or_malformed_payload_is_none() {
        assert!(parse_payload::<PreToolUseInput>("").is_none());
        assert!(parse_payload::<PreToolUseInput>("   \n").is_none());
        assert!(parse_payload::<PreToolUseInput>("{not json").is_none());
        assert!(parse_payload::<TaskCompletedInput>("[1,2]").is_none());
    }

    #[test]
    fn task_completed_blank_cwd_is_none() {
        let input: TaskCompletedInput = parse_payload(r#"{"cwd":""}"#).unwrap();
        assert_eq!(input.cwd(), None);
    }

    #[test]
    fn deny_output_shape() {
        let value = serde_json::to_value(PreToolUseOutput::deny("nope")).unwrap();
        assert_eq!(
            value,
            json!({
                "hookSpecificOutput": {
                    "hookEventName": "PreToolUse",
                    "permissionDecision": "deny",
                    "permissionDecisionReason": "nope"
                }
            })
        );
    }

    #[test]
    fn block_output_shape() {
        let value =
            serde_json::to_value(TaskCompletedOutput::block("testCommand failed", "log")).unwrap();
        assert_eq!(
            value,
            json!({
                "decision": "block",
                "reason": "testCommand failed",
                "hookSpecificOutput": {
                    "hookEventName": "TaskCompleted",
                    "additionalContext": "log"
                }
            })
        );
    }
}
