use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::backend::{check_quota, BackendError, KeyValueStore};

/// In-process store. Contents are lost when the process exits.
///
/// Usage is counted as key bytes plus value bytes, the same accounting a
/// browser applies to its per-origin storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic mid-insert cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Total bytes currently held.
    pub fn used_bytes(&self) -> usize {
        usage(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn usage(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.lock();
        let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let used = usage(&entries) - replaced;
        check_quota(self.quota_bytes, used, key.len() + value.len())?;
        entries.insert(key.to_string(), value.to_string());
        debug!("memory store: set {key} ({} bytes)", value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.lock().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("rolefit_jobs").unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let store = MemoryStore::new();
        store.set("rolefit_jobs", "[]").unwrap();
        assert_eq!(store.get("rolefit_jobs").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.remove("nothing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn usage_counts_key_and_value_bytes() {
        let store = MemoryStore::new();
        store.set("ab", "cde").unwrap();
        assert_eq!(store.used_bytes(), 5);
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_old_value() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        let err = store.set("k", "1234567890").unwrap_err();
        assert!(matches!(err, BackendError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn replacing_a_value_does_not_double_count_it() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "123456789").unwrap();
        // Same size again: the old value is released before the check.
        store.set("k", "987654321").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }
}
