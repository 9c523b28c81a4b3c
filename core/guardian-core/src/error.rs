//! Error types for tdd-guardian-core operations.
//!
//! Most of the engine degrades instead of failing (missing config means
//! defaults, missing state means "never passed"). These errors cover the
//! remaining paths where something actually went wrong on disk or in a spawn.

use std::path::PathBuf;

/// All errors that can occur in tdd-guardian-core operations.
#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    // ─────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // State Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("State write failed: {path}: {source}")]
    StateWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State path has no parent directory: {0}")]
    StatePathInvalid(PathBuf),

    // ─────────────────────────────────────────────────────────────────────
    // Command Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to spawn command: {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using GuardianError.
pub type Result<T> = std::result::Result<T, GuardianError>;

