//! Logging setup for the hook binary.
//!
//! Stdout belongs to the hook protocol, so logs go to
//! `~/.claude/tdd-guardian/logs/hook.log`, falling back to stderr when that
//! directory is unavailable.
//!
//! - `TDD_GUARDIAN_LOG`: `EnvFilter` directive (default `info`)
//! - `TDD_GUARDIAN_DEBUG_LOG=1`: force `debug`

use fs_err as fs;
use tdd_guardian_core::config::is_truthy;
use tdd_guardian_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "TDD_GUARDIAN_LOG";
const DEBUG_ENV: &str = "TDD_GUARDIAN_DEBUG_LOG";

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init() -> Option<WorkerGuard> {
    let filter = build_filter();

    if let Some(appender) = file_appender() {
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init();
        return Some(guard);
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
    None
}

fn build_filter() -> EnvFilter {
    let debug_enabled = std::env::var(DEBUG_ENV)
        .map(|value| is_truthy(&value))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn file_appender() -> Option<RollingFileAppender> {
    let dir = StorageConfig::log_dir()?;
    fs::create_dir_all(&dir).ok()?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("hook")
        .filename_suffix("log")
        .build(&dir)
        .ok()
}
