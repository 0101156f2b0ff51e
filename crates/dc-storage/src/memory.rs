//! In-process storage backend.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};
use std::time::Duration;

use dc_core::{DataResponse, SourceParams, StorageError};
use dc_source::SourceStorage;

use crate::entry::StoredEntry;
use crate::TRACING_TARGET;

/// Storage keeping entries in a map, with an optional TTL.
///
/// Expired entries read as absent and are dropped on the next access.
pub struct MemoryStorage<T> {
    entries: RwLock<HashMap<String, StoredEntry<T>>>,
    ttl: Option<Duration>,
}

impl<T> Default for MemoryStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStorage<T> {
    /// Create an empty storage without TTL.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Set the time-to-live for stored entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Get the configured TTL.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Number of entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the storage holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before - entries.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredEntry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredEntry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry, dropping it if it has expired.
    fn with_live_entry<R>(&self, key: &str, f: impl FnOnce(&StoredEntry<T>) -> R) -> Option<R> {
        {
            let entries = self.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(self.ttl) => return Some(f(entry)),
                Some(_) => {}
            }
        }

        let mut entries = self.write();
        // Re-check: another writer may have refreshed the entry
        if entries.get(key).is_some_and(|entry| entry.is_expired(self.ttl)) {
            entries.remove(key);
            tracing::debug!(target: TRACING_TARGET, key, "dropped expired memory entry");
        }
        entries.get(key).map(f)
    }
}

impl<T> SourceStorage<T> for MemoryStorage<T>
where
    T: Clone + Send + Sync,
{
    fn store(&self, response: &DataResponse<T>) -> Result<(), StorageError> {
        let entry = StoredEntry::from_response(response);
        self.write().insert(entry.key.clone(), entry);
        Ok(())
    }

    fn stored_data(&self, params: &SourceParams) -> Result<Option<T>, StorageError> {
        Ok(self.with_live_entry(&params.cache_key(), |entry| entry.data.clone()))
    }

    fn clear_stored_data(&self, params: &SourceParams) -> Result<(), StorageError> {
        let mut entries = self.write();
        if params.is_default() {
            entries.clear();
        } else {
            entries.remove(&params.cache_key());
        }
        Ok(())
    }

    fn has_stored_data(&self, params: &SourceParams) -> Result<bool, StorageError> {
        Ok(self.with_live_entry(&params.cache_key(), |_| ()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::SourceType;

    fn response(data: &str, key: &str) -> DataResponse<String> {
        DataResponse::new(data.to_string(), SourceType::Network).with_params(SourceParams::new(key))
    }

    #[test]
    fn test_memory_store_and_read() {
        let storage = MemoryStorage::<String>::new();
        storage.store(&response("a", "k1")).unwrap();

        assert_eq!(
            storage.stored_data(&SourceParams::new("k1")).unwrap(),
            Some("a".to_string())
        );
        assert!(storage.has_stored_data(&SourceParams::new("k1")).unwrap());
        assert!(!storage.has_stored_data(&SourceParams::new("k2")).unwrap());
    }

    #[test]
    fn test_memory_store_overwrites_key() {
        let storage = MemoryStorage::<String>::new();
        storage.store(&response("old", "k")).unwrap();
        storage.store(&response("new", "k")).unwrap();

        assert_eq!(storage.len(), 1);
        assert_eq!(
            storage.stored_data(&SourceParams::new("k")).unwrap(),
            Some("new".to_string())
        );
    }

    #[test]
    fn test_memory_force_flag_shares_key() {
        let storage = MemoryStorage::<String>::new();
        storage.store(&response("a", "k")).unwrap();

        let forced = SourceParams::new("k").with_force(true);
        assert!(storage.has_stored_data(&forced).unwrap());
    }

    // === Clear Tests ===

    #[test]
    fn test_memory_clear_single_key() {
        let storage = MemoryStorage::<String>::new();
        storage.store(&response("a", "k1")).unwrap();
        storage.store(&response("b", "k2")).unwrap();

        storage.clear_stored_data(&SourceParams::new("k1")).unwrap();

        assert!(!storage.has_stored_data(&SourceParams::new("k1")).unwrap());
        assert!(storage.has_stored_data(&SourceParams::new("k2")).unwrap());
    }

    #[test]
    fn test_memory_clear_default_clears_all() {
        let storage = MemoryStorage::<String>::new();
        storage.store(&response("a", "k1")).unwrap();
        storage.store(&response("b", "k2")).unwrap();

        storage.clear_stored_data(&SourceParams::default()).unwrap();

        assert!(storage.is_empty());
    }

    // === TTL Tests ===

    #[test]
    fn test_memory_expired_entry_reads_absent() {
        let storage = MemoryStorage::<String>::new().with_ttl(Duration::from_millis(10));
        storage.store(&response("a", "k")).unwrap();

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(storage.stored_data(&SourceParams::new("k")).unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_purge_expired() {
        let storage = MemoryStorage::<String>::new().with_ttl(Duration::from_millis(10));
        storage.store(&response("a", "k1")).unwrap();
        storage.store(&response("b", "k2")).unwrap();

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(storage.purge_expired(), 2);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_fresh_entry_survives_ttl() {
        let storage = MemoryStorage::<String>::new().with_ttl(Duration::from_secs(60));
        storage.store(&response("a", "k")).unwrap();

        assert_eq!(storage.purge_expired(), 0);
        assert!(storage.has_stored_data(&SourceParams::new("k")).unwrap());
    }
}
