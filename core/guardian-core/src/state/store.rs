//! File-backed gate record persistence.
//!
//! The gate runner is the only writer; the admission guard reads once per
//! check. There is no locking. Writes go through a temp file in the same
//! directory followed by a rename, so a concurrent reader sees either the old
//! record or the new one, never a torn file.
//!
//! # Defensive Design
//!
//! - Missing file → no record
//! - Empty file or corrupt JSON → no record (logged)
//! - Saving replaces the whole document; nothing from the old record survives

use fs_err as fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{GuardianError, Result};

use super::types::GateRecord;

pub struct GateStore {
    file_path: PathBuf,
}

impl GateStore {
    pub fn new(file_path: &Path) -> Self {
        GateStore {
            file_path: file_path.to_path_buf(),
        }
    }

    /// Reads the current record. Anything unreadable counts as "never passed".
    pub fn load(&self) -> Option<GateRecord> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read gate state");
                return None;
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %self.file_path.display(), "Empty gate state file");
            return None;
        }

        match serde_json::from_str::<GateRecord>(&content) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to parse gate state, treating as missing");
                None
            }
        }
    }

    /// Atomically replaces the record on disk, creating parent directories.
    pub fn save(&self, record: &GateRecord) -> Result<()> {
        let parent_dir = self
            .file_path
            .parent()
            .ok_or_else(|| GuardianError::StatePathInvalid(self.file_path.clone()))?;
        fs::create_dir_all(parent_dir).map_err(|source| GuardianError::StateWriteFailed {
            path: parent_dir.to_path_buf(),
            source,
        })?;

        let mut content =
            serde_json::to_string_pretty(record).map_err(|source| GuardianError::Json {
                context: "serialize gate state".to_string(),
                source,
            })?;
        content.push('\n');

        let write_failed = |source: std::io::Error| GuardianError::StateWriteFailed {
            path: self.file_path.clone(),
            source,
        };

        let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(write_failed)?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(write_failed)?;
        temp_file.flush().map_err(write_failed)?;
        temp_file
            .persist(&self.file_path)
            .map_err(|err| write_failed(err.error))?;

        tracing::debug!(path = %self.file_path.display(), "Gate state written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GateResult;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_file_returns_none() {
        let temp = tempdir().unwrap();
        let store = GateStore::new(&temp.path().join("state.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_empty_file_returns_none() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("state.json");
        std::fs::write(&file, "  \n").unwrap();
        assert!(GateStore::new(&file).load().is_none());
    }

    #[test]
    fn test_load_corrupt_json_returns_none() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("state.json");
        std::fs::write(&file, "{invalid json}").unwrap();
        assert!(GateStore::new(&file).load().is_none());
    }

    #[test]
    fn test_load_unparsable_timestamp_returns_none() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("state.json");
        std::fs::write(&file, r#"{"last_gate_passed_at":"yesterday"}"#).unwrap();
        assert!(GateStore::new(&file).load().is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let file = temp.path().join(".claude/tdd-guardian/state.json");
        let store = GateStore::new(&file);
        store
            .save(&GateRecord::passed(Utc::now(), false, "cov.json"))
            .unwrap();

        let record = store.load().unwrap();
        assert_eq!(record.last_result, Some(GateResult::Passed));
        assert_eq!(record.coverage_summary_path.as_deref(), Some("cov.json"));
    }

    #[test]
    fn test_save_replaces_instead_of_merging() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("state.json");
        let store = GateStore::new(&file);

        store
            .save(&GateRecord::passed(Utc::now(), true, "old.json"))
            .unwrap();
        store.save(&GateRecord::bypassed(Utc::now())).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        let object = raw.as_object().unwrap();
        assert_eq!(object["last_result"], "bypassed");
        assert!(!object.contains_key("require_mutation"));
        assert!(!object.contains_key("coverage_summary_path"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("state.json");
        let store = GateStore::new(&file);
        store.save(&GateRecord::bypassed(Utc::now())).unwrap();
        store.save(&GateRecord::bypassed(Utc::now())).unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
