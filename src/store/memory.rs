use crate::error::StoreError;
use dashmap::DashMap;

/// In-memory string-to-string map local to one participant.
///
/// Backed by `DashMap` so a coordinator broadcast (writes) and client reads
/// can run concurrently without external locking. Mutated only through
/// `put`/`delete`/`load`; never speculatively during a 2PC round.
pub struct KeyValueStore {
    entries: DashMap<String, String>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns the value for `key`, or `NotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    /// Inserts or overwrites. Always succeeds.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes `key`, or fails with `NotFound` if it was never present.
    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    /// Dumps the current contents as a list of pairs for persistence.
    /// Order is unspecified.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Bulk-initializes the map at startup. Entries with duplicate keys
    /// take the last value.
    pub fn load(&self, entries: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in entries {
            self.entries.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}
