//! Operator-facing gate status report.
//!
//! Not a hook: prints a human-readable summary of what the admission guard
//! would see right now for a project.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::PathBuf;
use tdd_guardian_core::config::{process_env, EnvLookup, GuardianConfig};
use tdd_guardian_core::{GateStore, StorageConfig};

pub fn run(cwd: Option<PathBuf>) {
    let storage = match cwd {
        Some(path) => StorageConfig::for_project(path),
        None => StorageConfig::from_cwd(None),
    };
    print!("{}", render(&storage, &process_env, Utc::now()));
}

pub fn render(storage: &StorageConfig, env: EnvLookup<'_>, now: DateTime<Utc>) -> String {
    let config_path = storage.config_file();
    let state_path = storage.state_file();
    let config = GuardianConfig::load(&config_path);
    let record = GateStore::new(&state_path).load();
    let window = config.gate_freshness_minutes();

    let mut out = String::new();
    let _ = writeln!(out, "TDD Guardian status");
    let _ = writeln!(out, "  project:      {}", storage.project_root().display());
    let _ = writeln!(
        out,
        "  config:       {}{}",
        config_path.display(),
        if config_path.exists() { "" } else { " (missing)" }
    );
    let _ = writeln!(out, "  state:        {}", state_path.display());
    let _ = writeln!(out, "  enabled:      {}", yes_no(config.enabled()));
    let _ = writeln!(
        out,
        "  bypass:       {} ({})",
        if config.bypass_active(env) { "active" } else { "inactive" },
        config.bypass_env()
    );
    let _ = writeln!(
        out,
        "  freshness:    {} (window {} min)",
        if config.blocks_without_fresh_gate() { "enforced" } else { "not enforced" },
        window
    );

    match record.as_ref().and_then(|r| r.last_gate_passed_at.map(|at| (r, at))) {
        Some((record, passed_at)) => {
            let result = record.last_result.map_or("unknown", |r| r.as_str());
            let age = record.age_minutes(now).unwrap_or_default();
            let _ = writeln!(out, "  last gate:    {} at {}", result, passed_at.to_rfc3339());
            let _ = writeln!(
                out,
                "  age:          {:.1} min ({})",
                age,
                if record.is_fresh(now, window) { "fresh" } else { "stale" }
            );
        }
        None => {
            let _ = writeln!(out, "  last gate:    none recorded");
        }
    }

    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
