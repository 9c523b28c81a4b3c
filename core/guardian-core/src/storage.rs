//! Storage configuration and path management for TDD Guardian.
//!
//! All guardian files for a project live under `<project>/.claude/tdd-guardian/`.
//! Both hooks derive paths from the hook payload's `cwd`, so the admission
//! check and the gate runner always agree on which `state.json` they share.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: All path decisions centralized here
//! - **Testable**: `StorageConfig::for_project(temp_dir)` isolates tests

use std::path::{Path, PathBuf};

/// Project-relative directory holding config and state.
pub const GUARDIAN_DIR: [&str; 2] = [".claude", "tdd-guardian"];

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Project working directory (hook payload `cwd`).
    project_root: PathBuf,
    /// `<project_root>/.claude/tdd-guardian`
    root: PathBuf,
}

impl StorageConfig {
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let root = GUARDIAN_DIR
            .iter()
            .fold(project_root.clone(), |path, part| path.join(part));
        Self { project_root, root }
    }

    /// Uses the payload cwd when present, otherwise the process working directory.
    pub fn from_cwd(cwd: Option<&str>) -> Self {
        let project_root = cwd
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::for_project(project_root)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to config.json (operator-authored policy).
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Path to state.json (last gate outcome, written by the gate runner).
    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE_NAME)
    }

    /// Resolves a project-relative path; absolute paths pass through unchanged.
    pub fn resolve_project_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.project_root.join(candidate)
        }
    }

    /// Directory for hook log files (`~/.claude/tdd-guardian/logs`).
    pub fn log_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            GUARDIAN_DIR
                .iter()
                .fold(home, |path, part| path.join(part))
                .join("logs")
        })
    }
}
