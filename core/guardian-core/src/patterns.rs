//! Compiled regex patterns for classifying shell commands.
//!
//! A command is sensitive when any pattern matches anywhere in its text.
//! Matching is syntax-unaware on purpose: `cd app && git commit -m x` is
//! sensitive, and so is a commit buried in a `bash -c` string.
//! Add a pattern here when a new irreversible collaboration verb needs gating.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which irreversible action a sensitive command performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensitiveAction {
    Commit,
    Push,
    PullRequest,
    Publish,
}

impl SensitiveAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Push => "push",
            Self::PullRequest => "pull-request",
            Self::Publish => "publish",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Version Control
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_GIT_COMMIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bgit\s+commit\b").unwrap());
pub static RE_GIT_PUSH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bgit\s+push\b").unwrap());
pub static RE_GH_PR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgh\s+pr\s+(create|merge)\b").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Package Registries
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_JS_PUBLISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(npm|pnpm|yarn|bun)\s+publish\b").unwrap());
pub static RE_CARGO_PUBLISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bcargo\s+publish\b").unwrap());
pub static RE_PY_PUBLISH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(poetry\s+publish|twine\s+upload)\b").unwrap());

static SENSITIVE_PATTERNS: [(&Lazy<Regex>, SensitiveAction); 6] = [
    (&RE_GIT_COMMIT, SensitiveAction::Commit),
    (&RE_GIT_PUSH, SensitiveAction::Push),
    (&RE_GH_PR, SensitiveAction::PullRequest),
    (&RE_JS_PUBLISH, SensitiveAction::Publish),
    (&RE_CARGO_PUBLISH, SensitiveAction::Publish),
    (&RE_PY_PUBLISH, SensitiveAction::Publish),
];

/// Returns the first sensitive action found in `command`, if any.
pub fn classify_command(command: &str) -> Option<SensitiveAction> {
    SENSITIVE_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(command))
        .map(|(_, action)| *action)
}

pub fn is_sensitive_command(command: &str) -> bool {
    classify_command(command).is_some()
}
