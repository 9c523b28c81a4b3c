//! tdd-guardian: Claude Code hook handlers for TDD Guardian quality gates.
//!
//! Called directly by Claude Code hooks configured in `.claude/settings.json`.
//!
//! ## Subcommands
//!
//! - `pre-tool-use`: Admission guard, reads PreToolUse JSON from stdin
//! - `task-completed`: Gate pipeline, reads TaskCompleted JSON from stdin
//! - `status`: Human-readable gate status for a project
//!
//! Hook subcommands always exit 0. The decision travels on stdout: one JSON
//! line to deny/block, nothing to allow.

mod framing;
mod logging;
mod pre_tool_use;
mod status;
mod task_completed;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tdd-guardian")]
#[command(about = "Quality gate enforcement for AI coding agents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a proposed Bash command may run (reads JSON from stdin)
    PreToolUse,

    /// Run the quality gate pipeline for a completed task (reads JSON from stdin)
    TaskCompleted,

    /// Show config, last gate result, and freshness for a project
    Status {
        /// Project directory (defaults to the current directory)
        #[arg(long, value_name = "PATH")]
        cwd: Option<PathBuf>,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::PreToolUse => {
            // Fail open: an internal error must never block the agent
            if let Err(e) = pre_tool_use::run() {
                tracing::warn!(error = %e, "pre-tool-use failed, allowing");
            }
        }
        Commands::TaskCompleted => {
            if let Err(e) = task_completed::run() {
                tracing::warn!(error = %e, "task-completed failed, passing through");
            }
        }
        Commands::Status { cwd } => status::run(cwd),
    }
}
