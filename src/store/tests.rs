//! Store Module Tests
//!
//! Validates the local key-value map and its snapshot persistence.
//!
//! ## Test Scopes
//! - **KeyValueStore**: basic operations, error cases, and concurrent access.
//! - **Persistence**: snapshot round-trips, missing files, duplicate keys.

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::store::memory::KeyValueStore;
    use crate::store::persistence::{load_snapshot, save_snapshot};
    use std::sync::Arc;

    // ============================================================
    // KEY-VALUE STORE TESTS
    // ============================================================

    #[test]
    fn test_get_missing_key_fails_not_found() {
        let store = KeyValueStore::new();

        let result = store.get("missing");
        assert_eq!(
            result,
            Err(StoreError::NotFound {
                key: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_put_then_get() {
        let store = KeyValueStore::new();

        store.put("k1", "v1");
        assert_eq!(store.get("k1").unwrap(), "v1");
    }

    #[test]
    fn test_put_overwrites_existing_value() {
        let store = KeyValueStore::new();

        store.put("k1", "original");
        store.put("k1", "updated");

        assert_eq!(store.get("k1").unwrap(), "updated");
        assert_eq!(store.len(), 1, "Overwrite should not add a second entry");
    }

    #[test]
    fn test_get_is_idempotent() {
        let store = KeyValueStore::new();
        store.put("k1", "v1");

        // Two reads with no intervening mutation must agree
        assert_eq!(store.get("k1").unwrap(), store.get("k1").unwrap());
    }

    #[test]
    fn test_delete_existing_key() {
        let store = KeyValueStore::new();
        store.put("k1", "v1");

        store.delete("k1").unwrap();

        assert!(store.is_empty());
        assert!(store.get("k1").is_err(), "Deleted key should be gone");
    }

    #[test]
    fn test_delete_missing_key_fails_not_found() {
        let store = KeyValueStore::new();

        let result = store.delete("missing");
        assert_eq!(
            result,
            Err(StoreError::NotFound {
                key: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_load_duplicate_keys_last_value_wins() {
        let store = KeyValueStore::new();

        store.load(vec![
            ("k1".to_string(), "first".to_string()),
            ("k2".to_string(), "v2".to_string()),
            ("k1".to_string(), "second".to_string()),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("k1").unwrap(), "second");
    }

    #[test]
    fn test_snapshot_contains_all_entries() {
        let store = KeyValueStore::new();
        for i in 0..100 {
            store.put(format!("key-{:03}", i), format!("value-{}", i));
        }

        let mut snapshot = store.snapshot();
        snapshot.sort();

        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot[0], ("key-000".to_string(), "value-0".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writers() {
        let store = Arc::new(KeyValueStore::new());
        let mut handles = Vec::new();

        // 8 writer tasks on disjoint key ranges plus 8 readers hammering the map
        for task in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    store.put(format!("t{}-k{}", task, i), format!("{}", i));
                }
            }));
        }
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let _ = store.get(&format!("t0-k{}", i));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 800, "All writes should land exactly once");
    }

    // ============================================================
    // PERSISTENCE TESTS
    // ============================================================

    fn temp_snapshot_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("kv_snapshot_{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let path = temp_snapshot_path();

        let store = KeyValueStore::new();
        store.put("k1", "v1");
        store.put("k2", "value with spaces");
        save_snapshot(&path, &store).unwrap();

        let reloaded = load_snapshot(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("k1").unwrap(), "v1");
        assert_eq!(reloaded.get("k2").unwrap(), "value with spaces");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_yields_empty_store() {
        let path = temp_snapshot_path();

        let store = load_snapshot(&path).unwrap();
        assert!(store.is_empty(), "First boot should start empty");
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let path = temp_snapshot_path();
        std::fs::write(&path, "not json at all").unwrap();

        assert!(load_snapshot(&path).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let path = temp_snapshot_path();

        let store = KeyValueStore::new();
        store.put("k1", "v1");
        save_snapshot(&path, &store).unwrap();

        store.delete("k1").unwrap();
        store.put("k2", "v2");
        save_snapshot(&path, &store).unwrap();

        let reloaded = load_snapshot(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.get("k1").is_err());
        assert_eq!(reloaded.get("k2").unwrap(), "v2");

        std::fs::remove_file(&path).unwrap();
    }
}
