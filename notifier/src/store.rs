//! Durable persistence for pending reminders.
//!
//! The reminder subsystem persists its pending entries so that timers armed
//! before a restart are not lost. Persistence is deliberately coarse: the
//! whole collection, keyed by task id, is read and written as one unit on
//! every mutation. This keeps the storage contract small enough to swap in
//! any string-keyed durable store.
//!
//! Two implementations are provided:
//!
//! - [`FileReminderStore`] - JSON file under the notifier data directory.
//!   A corrupt or missing file loads as an empty collection; it is repaired
//!   by the next save.
//! - [`MemoryReminderStore`] - in-process map for tests and embedders.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::ReminderEntry;

/// The persisted reminder collection, keyed by task id.
pub type ReminderCollection = HashMap<String, ReminderEntry>;

/// Errors that can occur while reading or writing the reminder collection.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File system I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the collection failed.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable storage port for the reminder collection.
///
/// Implementations must be safe to share across tasks; the timer registry
/// serializes whole read-modify-write sequences around these calls.
pub trait ReminderStore: Send + Sync {
    /// Loads the full collection.
    ///
    /// A store that cannot produce a usable collection for recoverable
    /// reasons (missing file, corrupt contents) returns an empty collection
    /// rather than an error; `Err` is reserved for genuinely unreadable
    /// storage.
    fn load(&self) -> Result<ReminderCollection, StoreError>;

    /// Replaces the full collection.
    fn save(&self, entries: &ReminderCollection) -> Result<(), StoreError>;
}

/// Reminder collection persisted as JSON in a single file.
#[derive(Debug)]
pub struct FileReminderStore {
    path: PathBuf,
}

impl FileReminderStore {
    /// Creates a store backed by the given file path. The file and its parent
    /// directory are created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ReminderStore for FileReminderStore {
    fn load(&self) -> Result<ReminderCollection, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted reminders");
                return Ok(ReminderCollection::new());
            }
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                // Corrupt contents are not fatal: start over with an empty
                // collection and let the next save repair the file.
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "persisted reminders are corrupt, treating as empty"
                );
                Ok(ReminderCollection::new())
            }
        }
    }

    fn save(&self, entries: &ReminderCollection) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a sibling temp file first so an interrupted save never
        // leaves a half-written collection behind.
        let tmp = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory reminder collection for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    entries: Mutex<ReminderCollection>,
}

impl MemoryReminderStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReminderStore for MemoryReminderStore {
    fn load(&self) -> Result<ReminderCollection, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save(&self, entries: &ReminderCollection) -> Result<(), StoreError> {
        *self.entries.lock().unwrap_or_else(|e| e.into_inner()) = entries.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskSummary;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn entry(task_id: &str) -> ReminderEntry {
        ReminderEntry {
            task_id: task_id.to_string(),
            fire_at: Utc.with_ymd_and_hms(2025, 6, 15, 13, 0, 0).unwrap(),
            summary: TaskSummary {
                title: "Write report".to_string(),
                due_date: "2025-06-15".to_string(),
                due_time: Some("14:00".to_string()),
            },
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileReminderStore::new(dir.path().join("reminders.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileReminderStore::new(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileReminderStore::new(dir.path().join("reminders.json"));

        let mut entries = ReminderCollection::new();
        entries.insert("task-1".to_string(), entry("task-1"));
        entries.insert("task-2".to_string(), entry("task-2"));
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("reminders.json");
        let store = FileReminderStore::new(&path);

        store.save(&ReminderCollection::new()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_replaces_previous_collection() {
        let dir = TempDir::new().unwrap();
        let store = FileReminderStore::new(dir.path().join("reminders.json"));

        let mut entries = ReminderCollection::new();
        entries.insert("task-1".to_string(), entry("task-1"));
        store.save(&entries).unwrap();

        entries.clear();
        entries.insert("task-2".to_string(), entry("task-2"));
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("task-2"));
    }

    #[test]
    fn corrupt_file_is_repaired_by_next_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileReminderStore::new(&path);
        let mut entries = store.load().unwrap();
        entries.insert("task-1".to_string(), entry("task-1"));
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryReminderStore::new();
        assert!(store.load().unwrap().is_empty());

        let mut entries = ReminderCollection::new();
        entries.insert("task-1".to_string(), entry("task-1"));
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }
}
