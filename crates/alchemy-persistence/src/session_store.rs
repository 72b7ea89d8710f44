//! Session stores keyed by session id.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use alchemy_models::{SessionId, SessionRecord};
use tracing::warn;

use crate::atomic::{atomic_write_json, read_json};
use crate::error::{PersistenceError, Result};

/// Storage for session records.
///
/// Implementations only need single-record atomicity; serializing the
/// read-modify-write cycle of one session is the caller's job.
pub trait SessionStore: Send + Sync {
    /// Insert or replace a record.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Load a record, failing with [`PersistenceError::NotFound`] if absent.
    fn load(&self, id: &SessionId) -> Result<SessionRecord>;

    /// Remove a record. Removing an absent record is not an error.
    fn delete(&self, id: &SessionId) -> Result<()>;

    /// Ids of all stored records.
    fn list_ids(&self) -> Result<Vec<SessionId>>;
}

/// Stores each session as a JSON file:
/// ```text
/// base_path/
/// └── sessions/
///     ├── 0b6f...e1.json
///     └── 9a41...7c.json
/// ```
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Creates a new store rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn sessions_dir(&self) -> PathBuf {
        self.base_path.join("sessions")
    }

    fn session_path(&self, id: &SessionId) -> Result<PathBuf> {
        if !id.is_path_safe() {
            return Err(PersistenceError::InvalidId(id.to_string()));
        }
        Ok(self.sessions_dir().join(format!("{}.json", id)))
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let path = self.session_path(&record.state.id)?;
        atomic_write_json(&path, record)
    }

    fn load(&self, id: &SessionId) -> Result<SessionRecord> {
        let path = self.session_path(id)?;
        if !path.exists() {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        read_json(&path)
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let path = self.session_path(id)?;
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|source| PersistenceError::WriteError { path, source })?;
        }
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        let dir = self.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| PersistenceError::ReadError {
            path: dir.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| PersistenceError::ReadError {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match path.file_stem().and_then(|s| s.to_str()).map(SessionId::from_string) {
                    Some(id) if id.is_path_safe() => ids.push(id),
                    _ => warn!(path = %path.display(), "Skipping unexpected session file name"),
                }
            }
        }
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

/// Process-local store, for tests and single-process deployments.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        records.insert(record.state.id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<SessionRecord> {
        let records = self
            .records
            .read()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &SessionId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        records.remove(id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        let records = self
            .records
            .read()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        let mut ids: Vec<SessionId> = records.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alchemy_models::{ComponentData, ComponentSchema, Exchange, SessionState, StatePatch};
    use tempfile::tempdir;

    fn record(id: &str) -> SessionRecord {
        let state = SessionState::new(
            SessionId::from_string(id),
            "Create a button",
            ComponentSchema::Full,
        )
        .apply(
            StatePatch::new()
                .classifier_verdict("no")
                .append_history(vec![Exchange::new("What color?", "blue")])
                .suspend_with("What label?"),
        );
        SessionRecord::new(state)
    }

    fn exercise(store: &dyn SessionStore) {
        let rec = record("s-1");
        store.save(&rec).unwrap();
        assert_eq!(store.load(&rec.state.id).unwrap(), rec);

        let updated = rec.clone().update(
            rec.state
                .clone()
                .apply(StatePatch::new().component_data(ComponentData::full("i", "m", "c", "d"))),
        );
        store.save(&updated).unwrap();
        assert_eq!(store.load(&rec.state.id).unwrap(), updated);

        store.save(&record("s-2")).unwrap();
        let ids = store.list_ids().unwrap();
        assert_eq!(ids, vec![SessionId::from("s-1"), SessionId::from("s-2")]);

        store.delete(&rec.state.id).unwrap();
        assert!(matches!(
            store.load(&rec.state.id),
            Err(PersistenceError::NotFound(_))
        ));
        // Deleting again is fine
        store.delete(&rec.state.id).unwrap();
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempdir().unwrap();
        exercise(&FileSessionStore::new(dir.path()));
    }

    #[test]
    fn test_memory_store_lifecycle() {
        exercise(&MemorySessionStore::new());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let rec = record("s-reopen");
        FileSessionStore::new(dir.path()).save(&rec).unwrap();

        let reopened = FileSessionStore::new(dir.path());
        assert_eq!(reopened.load(&rec.state.id).unwrap(), rec);
    }

    #[test]
    fn test_file_store_rejects_unsafe_ids() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let result = store.load(&SessionId::from_string("../../etc/passwd"));
        assert!(matches!(result, Err(PersistenceError::InvalidId(_))));
    }

    #[test]
    fn test_file_store_listing_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&record("s-1")).unwrap();
        fs::write(store.sessions_dir().join("notes copy.json"), "{}").unwrap();
        fs::write(store.sessions_dir().join("readme.txt"), "").unwrap();

        assert_eq!(store.list_ids().unwrap(), vec![SessionId::from("s-1")]);
    }

    #[test]
    fn test_file_store_empty_listing() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert!(store.list_ids().unwrap().is_empty());
    }
}
