//! Preset leaderboard written the first time the store is seen empty

use crate::entry::ScoreEntry;
use crate::error::StorageResult;
use crate::store::ScoreStore;

/// Preset (name, score) pairs, highest first
pub const PRESETS: [(&str, u64); 20] = [
    ("Legend", 505),
    ("ProFish", 480),
    ("NightCat", 455),
    ("TideMaster", 430),
    ("WaveRider", 405),
    ("SilverFin", 380),
    ("GoldenHook", 355),
    ("LuckyPaw", 330),
    ("BaitBoss", 305),
    ("ReelQueen", 280),
    ("Bubble", 255),
    ("Minnow", 230),
    ("Guppy", 205),
    ("Sprout", 180),
    ("TinyFin", 155),
    ("Drift", 130),
    ("Pebble", 105),
    ("Ripple", 80),
    ("Splash", 55),
    ("Starter", 30),
];

/// Preset entries stamped with `now`
pub fn preset_entries(now: u64) -> Vec<ScoreEntry> {
    PRESETS
        .iter()
        .map(|&(name, score)| ScoreEntry::new(name, score, now))
        .collect()
}

/// Write the presets if the store holds nothing.
/// Returns true if it seeded.
pub fn seed_if_empty(store: &ScoreStore, now: u64) -> StorageResult<bool> {
    if !store.load().is_empty() {
        return Ok(false);
    }

    store.save(&preset_entries(now))?;
    log::info!("Seeded leaderboard with {} presets", PRESETS.len());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STORAGE_KEY;
    use crate::platform::{KeyValueStorage, MemoryStorage};

    #[test]
    fn test_presets_are_ranked() {
        assert!(PRESETS.windows(2).all(|w| w[0].1 > w[1].1));
        assert_eq!(PRESETS.first().map(|p| p.1), Some(505));
        assert_eq!(PRESETS.last().map(|p| p.1), Some(30));
    }

    #[test]
    fn test_seed_only_when_empty() {
        let storage = MemoryStorage::new();
        let store = ScoreStore::new(Box::new(storage.clone()), STORAGE_KEY);

        assert!(seed_if_empty(&store, 100).unwrap());
        let first = storage.get_item(STORAGE_KEY).unwrap();
        assert_eq!(store.load().len(), 20);

        // Second call sees data and must leave it byte-for-byte alone
        assert!(!seed_if_empty(&store, 200).unwrap());
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap(), first);
        assert!(store.load().iter().all(|e| e.timestamp == 100));
    }

    #[test]
    fn test_seed_skips_existing_scores() {
        let storage = MemoryStorage::new();
        let store = ScoreStore::new(Box::new(storage), STORAGE_KEY);
        store.save(&[ScoreEntry::new("Nemo", 1, 1)]).unwrap();

        assert!(!seed_if_empty(&store, 5).unwrap());
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_seed_after_corrupt_data() {
        let storage = MemoryStorage::new();
        storage.set_item(STORAGE_KEY, "garbage").unwrap();
        let store = ScoreStore::new(Box::new(storage), STORAGE_KEY);

        assert!(seed_if_empty(&store, 5).unwrap());
        assert_eq!(store.load().len(), 20);
    }
}
