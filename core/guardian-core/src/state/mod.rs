//! Gate state shared between the two hooks.
//!
//! ```text
//! TaskCompleted hook → GateStore::save → state.json → GateStore::load → PreToolUse hook
//!     (writer)                           (storage)                      (reader)
//! ```
//!
//! - [`types`]: the on-disk record and its freshness rule
//! - [`store`]: load/save with atomic replacement

mod store;
mod types;

pub use store::GateStore;
pub use types::{GateRecord, GateResult};
