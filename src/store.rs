//! Score collection persistence
//!
//! The whole collection is one JSON array under one key, kept in insertion
//! order. Ranking happens only at render time.

use serde_json::Value;

use crate::entry::ScoreEntry;
use crate::error::StorageResult;
use crate::platform::KeyValueStorage;

/// Score collection bound to a storage backend and key
pub struct ScoreStore {
    storage: Box<dyn KeyValueStorage>,
    key: String,
}

impl ScoreStore {
    pub fn new(storage: Box<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Load the collection. Never fails: anything unreadable is empty.
    pub fn load(&self) -> Vec<ScoreEntry> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read leaderboard: {}", e);
                return Vec::new();
            }
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                log::warn!("Stored leaderboard is not an array, treating as empty");
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Failed to parse leaderboard: {}", e);
                return Vec::new();
            }
        };

        let total = items.len();
        let entries: Vec<ScoreEntry> = items
            .iter()
            .filter_map(|item| ScoreEntry::from_value(item, 0))
            .collect();
        if entries.len() < total {
            log::warn!("Skipped {} malformed leaderboard rows", total - entries.len());
        }
        entries
    }

    /// Overwrite the stored collection
    pub fn save(&self, entries: &[ScoreEntry]) -> StorageResult<()> {
        let json = serde_json::to_string(entries)?;
        self.storage.set_item(&self.key, &json)?;
        log::info!("Leaderboard saved ({} entries)", entries.len());
        Ok(())
    }

    /// Remove the stored collection entirely
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove_item(&self.key)?;
        log::info!("Leaderboard cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STORAGE_KEY;
    use crate::platform::MemoryStorage;

    fn store() -> (MemoryStorage, ScoreStore) {
        let storage = MemoryStorage::new();
        let store = ScoreStore::new(Box::new(storage.clone()), STORAGE_KEY);
        (storage, store)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let (_, store) = store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let (storage, store) = store();
        storage.set_item(STORAGE_KEY, "{{{").unwrap();
        assert!(store.load().is_empty());

        storage.set_item(STORAGE_KEY, r#"{"name": "Nemo"}"#).unwrap();
        assert!(store.load().is_empty());

        storage.set_item(STORAGE_KEY, "null").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_skips_non_objects() {
        let (storage, store) = store();
        storage
            .set_item(STORAGE_KEY, r#"[1, {"name": "Nemo", "score": 9, "ts": 4}, "x", null]"#)
            .unwrap();
        assert_eq!(store.load(), vec![ScoreEntry::new("Nemo", 9, 4)]);
    }

    #[test]
    fn test_save_then_load_keeps_order() {
        let (storage, store) = store();
        let entries = vec![
            ScoreEntry::new("Low", 1, 10),
            ScoreEntry::for_session("sess_abcdefg", "Live", 99, 11),
            ScoreEntry::new("Mid", 50, 12),
        ];
        store.save(&entries).unwrap();
        assert_eq!(store.load(), entries);

        let raw = storage.get_item(STORAGE_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""_sessionId":"sess_abcdefg""#));
        assert!(raw.contains(r#""ts":10"#));
    }

    #[test]
    fn test_clear_removes_key() {
        let (storage, store) = store();
        store.save(&[ScoreEntry::new("Nemo", 1, 1)]).unwrap();
        store.clear().unwrap();
        assert!(!storage.contains_key(STORAGE_KEY));
        assert!(store.load().is_empty());
    }
}
