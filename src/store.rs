//! File-backed persistence for election snapshots.
//!
//! The CLI keeps the whole manager state in one JSON document and rewrites it
//! after each successful mutation. Saves go through a sibling temp file and a
//! rename so an interrupted write never truncates the previous state.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manager::ElectionSnapshot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed state file: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<ElectionSnapshot, StoreError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, snapshot: &ElectionSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = self.path.clone();
        tmp.set_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ElectionManager;
    use crate::models::Identity;
    use chrono::{Duration, TimeZone, Utc};

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("election-store-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn save_then_load_returns_the_same_state() {
        let store = SnapshotStore::new(scratch_path());
        let mut manager = ElectionManager::new(Identity::from("admin"));
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        manager
            .create_poll(
                &Identity::from("admin"),
                "Stored poll",
                vec!["A".into(), "B".into()],
                start,
                start + Duration::hours(1),
            )
            .unwrap();

        store.save(&manager.snapshot()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.administrator, Identity::from("admin"));
        assert_eq!(loaded.polls.len(), 1);
        assert_eq!(loaded.polls[0].title, "Stored poll");
        assert_eq!(loaded.events.len(), 1);

        fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let store = SnapshotStore::new(scratch_path());
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(StoreError::Io(_))));
    }

    #[test]
    fn save_overwrites_previous_state() {
        let store = SnapshotStore::new(scratch_path());
        let mut manager = ElectionManager::new(Identity::from("admin"));
        store.save(&manager.snapshot()).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        manager
            .create_poll(
                &Identity::from("admin"),
                "Second write",
                vec!["A".into()],
                start,
                start + Duration::hours(1),
            )
            .unwrap();
        store.save(&manager.snapshot()).unwrap();

        assert_eq!(store.load().unwrap().polls.len(), 1);
        fs::remove_file(store.path()).unwrap();
    }
}
