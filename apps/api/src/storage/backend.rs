//! Backend seam for the storage wrapper.
//!
//! A backend is a synchronous string-to-string store. It knows nothing about
//! JSON; the wrapper in `storage::Storage` owns encoding and decoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Quota exceeded: write needs {requested} bytes, {remaining} remaining")]
    QuotaExceeded { requested: usize, remaining: usize },

    #[error("Stored bytes are not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A persistent key-value store holding one text value per key.
///
/// Implementations guard their own state; every method must be safe to call
/// from several threads at once.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value under `key`, or `None` if nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), BackendError>;

    /// Short label for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Rejects a write that would push `used` past `quota`.
pub(crate) fn check_quota(
    quota: Option<usize>,
    used: usize,
    requested: usize,
) -> Result<(), BackendError> {
    match quota {
        Some(limit) if used.saturating_add(requested) > limit => Err(BackendError::QuotaExceeded {
            requested,
            remaining: limit.saturating_sub(used),
        }),
        _ => Ok(()),
    }
}
