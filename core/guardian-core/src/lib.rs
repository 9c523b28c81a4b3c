//! # tdd-guardian-core
//!
//! Gate policy engine for TDD Guardian: blocks commit/push/publish commands
//! from an AI coding agent until the project's test, coverage, and mutation
//! gates have passed recently.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Each hook is a single-shot process.
//! - **Two decision points, one record**: [`admission`] reads `state.json`,
//!   [`gate`] writes it. They never call each other.
//! - **Fail open on infrastructure, closed on policy**: missing or corrupt
//!   files mean defaults; only a deliberate policy evaluation denies.
//! - **Fresh reads**: config and state are loaded on every call.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tdd_guardian_core::{admission, config::process_env, gate::{GatePipeline, ShellRunner}};
//!
//! let decision = admission::evaluate(&input, &process_env, chrono::Utc::now());
//! let outcome = GatePipeline::new(&storage, &ShellRunner, &process_env).run();
//! ```

pub mod admission;
pub mod config;
pub mod error;
pub mod gate;
pub mod patterns;
pub mod state;
pub mod storage;

pub use admission::{AdmissionDecision, AllowReason, DenyReason};
pub use config::GuardianConfig;
pub use error::{GuardianError, Result};
pub use gate::{GateOutcome, GatePipeline, ShellRunner};
pub use patterns::{classify_command, is_sensitive_command, SensitiveAction};
pub use state::{GateRecord, GateResult, GateStore};
pub use storage::StorageConfig;
