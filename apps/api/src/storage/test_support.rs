//! Test doubles for `KeyValueStore`, shared by the storage and router tests.

use std::collections::HashSet;

use super::backend::{BackendError, KeyValueStore};
use super::memory::MemoryStore;

/// Backend that refuses everything, like a browser with storage disabled.
pub struct DisabledStore;

impl KeyValueStore for DisabledStore {
    fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
        Err(BackendError::Unavailable("storage disabled".to_string()))
    }
    fn set(&self, _key: &str, _value: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("storage disabled".to_string()))
    }
    fn remove(&self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::Unavailable("storage disabled".to_string()))
    }
    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

/// Memory store whose `remove` fails for the listed keys (all keys when empty).
pub struct StuckRemoveStore {
    pub inner: MemoryStore,
    stuck: HashSet<String>,
}

impl StuckRemoveStore {
    pub fn for_keys(keys: &[&str]) -> Self {
        Self {
            inner: MemoryStore::new(),
            stuck: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn for_all_keys() -> Self {
        Self::for_keys(&[])
    }
}

impl KeyValueStore for StuckRemoveStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.inner.get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.inner.set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), BackendError> {
        if self.stuck.is_empty() || self.stuck.contains(key) {
            return Err(BackendError::Io(std::io::Error::other(format!(
                "cannot remove {key}"
            ))));
        }
        self.inner.remove(key)
    }
    fn backend_name(&self) -> &'static str {
        "stuck-remove"
    }
}
