use log::debug;

use crate::session::SessionResult;
use crate::storage::{read_json, try_read_json, write_json, Storage, StorageError, HISTORY_KEY};

/// How many results the results screen keeps
pub const RECENT_HISTORY_CAPACITY: usize = 10;
/// How many results the statistics view keeps
pub const FULL_HISTORY_CAPACITY: usize = 50;

/// Bounded, newest-first list of finished sessions kept under `HISTORY_KEY`
#[derive(Debug, Clone)]
pub struct HistoryStore<S: Storage> {
    storage: S,
    capacity: usize,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S, capacity: usize) -> Self {
        Self {
            storage,
            capacity: capacity.max(1),
        }
    }

    pub fn recent(storage: S) -> Self {
        Self::new(storage, RECENT_HISTORY_CAPACITY)
    }

    pub fn full(storage: S) -> Self {
        Self::new(storage, FULL_HISTORY_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Missing or malformed history loads as empty
    pub fn load(&self) -> Vec<SessionResult> {
        read_json(&self.storage, HISTORY_KEY).unwrap_or_default()
    }

    /// Prepends `result`, trims to capacity and persists. Always merges into
    /// the value currently in storage, never a cached copy. A failed read
    /// aborts without writing.
    pub fn append(&self, result: SessionResult) -> Result<Vec<SessionResult>, StorageError> {
        let mut history: Vec<SessionResult> =
            try_read_json(&self.storage, HISTORY_KEY)?.unwrap_or_default();
        history.insert(0, result);
        history.truncate(self.capacity);
        write_json(&self.storage, HISTORY_KEY, &history)?;
        debug!("history now holds {} results", history.len());
        Ok(history)
    }

    pub fn clear(&self) -> Result<Vec<SessionResult>, StorageError> {
        self.storage.remove(HISTORY_KEY)?;
        Ok(Vec::new())
    }
}
