use serde::{Deserialize, Serialize};

use crate::history::FULL_HISTORY_CAPACITY;
use crate::mode::GameMode;
use crate::storage::{read_json, write_json, Storage, StorageError, SETTINGS_KEY};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mode: GameMode,
    /// Limit per session; `None` plays the whole bank
    pub question_count: Option<usize>,
    pub history_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GameMode::Classic,
            question_count: None,
            history_capacity: FULL_HISTORY_CAPACITY,
        }
    }
}

impl Settings {
    /// Number of questions a session draws from a bank of `available`
    pub fn questions_for(&self, available: usize) -> usize {
        self.question_count
            .map_or(available, |n| n.clamp(1, available.max(1)))
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct StorageSettingsStore<S: Storage> {
    storage: S,
}

impl<S: Storage> StorageSettingsStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> SettingsStore for StorageSettingsStore<S> {
    fn load(&self) -> Settings {
        read_json(&self.storage, SETTINGS_KEY).unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        write_json(&self.storage, SETTINGS_KEY, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let store = StorageSettingsStore::new(FileStorage::with_dir(dir.path()));
        let settings = Settings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let store = StorageSettingsStore::new(FileStorage::with_dir(dir.path()));
        let settings = Settings {
            mode: GameMode::Hard,
            question_count: Some(8),
            history_capacity: 10,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn malformed_settings_fall_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, "[not, settings]").unwrap();
        let store = StorageSettingsStore::new(storage);

        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let storage = MemoryStorage::new();
        storage.set(SETTINGS_KEY, r#"{"mode":"speed"}"#).unwrap();
        let store = StorageSettingsStore::new(storage);

        let settings = store.load();
        assert_eq!(settings.mode, GameMode::Speed);
        assert_eq!(settings.question_count, None);
        assert_eq!(settings.history_capacity, FULL_HISTORY_CAPACITY);
    }

    #[test]
    fn questions_for_clamps() {
        let mut settings = Settings::default();
        assert_eq!(settings.questions_for(16), 16);

        settings.question_count = Some(5);
        assert_eq!(settings.questions_for(16), 5);

        settings.question_count = Some(40);
        assert_eq!(settings.questions_for(16), 16);

        settings.question_count = Some(0);
        assert_eq!(settings.questions_for(16), 1);
    }
}
