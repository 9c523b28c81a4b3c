//! Quality gate pipeline run when a task is declared complete.
//!
//! - [`pipeline`]: the stage state machine and its outcome
//! - [`runner`]: shell execution behind the [`CommandRunner`] seam
//! - [`coverage`]: threshold check against a coverage summary
//! - [`log`]: execution log and tail truncation for block context

pub mod coverage;
pub mod log;
pub mod pipeline;
pub mod runner;

pub use coverage::{check_coverage, CoverageReport, MetricCheck};
pub use log::ExecutionLog;
pub use pipeline::{GateOutcome, GatePipeline, Stage};
pub use runner::{CommandOutput, CommandRunner, ShellRunner};
