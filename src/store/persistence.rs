//! Snapshot Persistence
//!
//! Serializes a participant's store as `{"data":[{"key":..,"value":..}]}`.
//! The snapshot is loaded once at process startup and rewritten when a client
//! sends `STOP`. A missing file is a first boot, not an error.

use super::memory::KeyValueStore;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub data: Vec<SnapshotEntry>,
}

/// Loads a store from `path`. Returns an empty store when the file does not
/// exist; any other I/O or parse failure is an error.
pub fn load_snapshot(path: &Path) -> Result<KeyValueStore> {
    let store = KeyValueStore::new();

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No snapshot at {}, starting empty", path.display());
            return Ok(store);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read snapshot {}", path.display()));
        }
    };

    let snapshot: SnapshotFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;

    store.load(
        snapshot
            .data
            .into_iter()
            .map(|entry| (entry.key, entry.value)),
    );
    tracing::info!("Loaded {} entries from {}", store.len(), path.display());

    Ok(store)
}

/// Writes the whole store to `path`, replacing any previous snapshot.
pub fn save_snapshot(path: &Path, store: &KeyValueStore) -> Result<()> {
    let snapshot = SnapshotFile {
        data: store
            .snapshot()
            .into_iter()
            .map(|(key, value)| SnapshotEntry { key, value })
            .collect(),
    };

    let contents = serde_json::to_string(&snapshot).context("failed to serialize snapshot")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;

    tracing::info!(
        "Persisted {} entries to {}",
        snapshot.data.len(),
        path.display()
    );
    Ok(())
}
