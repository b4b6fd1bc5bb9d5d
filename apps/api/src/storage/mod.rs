// Persistent JSON key-value storage for the CV studio.
// The wrapper owns JSON encoding and error classification; backends only move text.
// Blocking backend calls from async handlers must run inside tokio::task::spawn_blocking.

pub mod backend;
pub mod file;
pub mod handlers;
pub mod keys;
pub mod memory;
#[cfg(test)]
pub(crate) mod test_support;

use std::string::FromUtf8Error;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub use backend::{BackendError, KeyValueStore};
pub use file::FileStore;
pub use keys::StorageKey;
pub use memory::MemoryStore;

/// Temporary probe key written and removed by `Storage::is_available`.
pub const SENTINEL_KEY: &str = "__storage_test__";

const PROBE_UNKNOWN: u8 = 0;
const PROBE_AVAILABLE: u8 = 1;
const PROBE_UNAVAILABLE: u8 = 2;

/// Why a stored document could not be decoded.
#[derive(Debug, Error)]
pub enum Corruption {
    #[error("not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to serialize value for '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write { key: String, source: BackendError },

    #[error("Failed to read '{key}': {source}")]
    Read { key: String, source: BackendError },

    #[error("Stored value under '{key}' is corrupted: {source}")]
    Corrupted { key: String, source: Corruption },

    #[error("Storage unavailable: {0}")]
    Unavailable(#[source] BackendError),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            StorageError::Write {
                source: BackendError::QuotaExceeded { .. },
                ..
            }
        )
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(
            self,
            StorageError::Write {
                source: BackendError::InvalidKey(_),
                ..
            } | StorageError::Read {
                source: BackendError::InvalidKey(_),
                ..
            }
        )
    }

    fn from_write(key: &str, source: BackendError) -> Self {
        match source {
            BackendError::Unavailable(_) => StorageError::Unavailable(source),
            source => StorageError::Write {
                key: key.to_string(),
                source,
            },
        }
    }

    fn from_read(key: &str, source: BackendError) -> Self {
        match source {
            BackendError::Unavailable(_) => StorageError::Unavailable(source),
            BackendError::InvalidUtf8(e) => StorageError::Corrupted {
                key: key.to_string(),
                source: Corruption::Encoding(e),
            },
            source => StorageError::Read {
                key: key.to_string(),
                source,
            },
        }
    }
}

/// JSON save/load/remove/clear over an injected `KeyValueStore`.
///
/// Writers (save, remove, clear, update, the availability probe) share one lock,
/// so `update` is a true read-modify-write. Loads are lock-free.
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
    last_probe: AtomicU8,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
            last_probe: AtomicU8::new(PROBE_UNKNOWN),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Serializes `data` to JSON and writes it under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let _guard = self.lock_writes();
        self.save_locked(key, data)
    }

    fn save_locked<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(data).map_err(|source| {
            error!("Storage save error for '{key}': {source}");
            StorageError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;

        self.backend.set(key, &raw).map_err(|e| {
            let err = StorageError::from_write(key, e);
            error!("Storage save error: {err}");
            err
        })
    }

    /// Reads and parses the JSON stored under `key`.
    ///
    /// Absent and empty values both load as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw = self.backend.get(key).map_err(|e| {
            let err = StorageError::from_read(key, e);
            match err {
                StorageError::Corrupted { .. } => warn!("Storage load error: {err}"),
                _ => error!("Storage load error: {err}"),
            }
            err
        })?;

        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(None);
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            warn!("Storage load error: corrupted value under '{key}': {e}");
            StorageError::Corrupted {
                key: key.to_string(),
                source: e.into(),
            }
        })
    }

    /// Deletes `key`; absent keys are a no-op.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock_writes();
        self.remove_locked(key)
    }

    fn remove_locked(&self, key: &str) -> Result<(), StorageError> {
        self.backend
            .remove(key)
            .map_err(|e| StorageError::from_write(key, e))
    }

    /// Removes the app's known keys. Other keys in the same backend are untouched.
    ///
    /// Every key is attempted; the first failure is returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock_writes();
        let mut first_err = None;
        for key in StorageKey::ALL {
            if let Err(e) = self.remove_locked(key.as_str()) {
                error!("Storage clear error: {e}");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Probes the backend by writing and removing `SENTINEL_KEY`.
    pub fn is_available(&self) -> bool {
        let _guard = self.lock_writes();
        let probe = self
            .backend
            .set(SENTINEL_KEY, SENTINEL_KEY)
            .and_then(|()| self.backend.remove(SENTINEL_KEY));
        let available = match probe {
            Ok(()) => true,
            Err(e) => {
                warn!("{} store failed availability probe: {e}", self.backend_name());
                false
            }
        };
        let state = if available {
            PROBE_AVAILABLE
        } else {
            PROBE_UNAVAILABLE
        };
        self.last_probe.store(state, Ordering::Relaxed);
        available
    }

    /// Result of the most recent `is_available` call, without touching the backend.
    /// `None` until the first probe.
    pub fn last_probe(&self) -> Option<bool> {
        match self.last_probe.load(Ordering::Relaxed) {
            PROBE_AVAILABLE => Some(true),
            PROBE_UNAVAILABLE => Some(false),
            _ => None,
        }
    }

    /// Atomically replaces the value under `key` with `f(current)`.
    ///
    /// A corrupted current value is returned as an error rather than passed to `f`.
    pub fn update<T, F>(&self, key: &str, f: F) -> Result<T, StorageError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let _guard = self.lock_writes();
        let current = self.load(key)?;
        let next = f(current);
        self.save_locked(key, &next)?;
        Ok(next)
    }
}
