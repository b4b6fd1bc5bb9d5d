//! Directory-backed store: one JSON document per key.
//!
//! Layout: `<dir>/<key>.json`. Writes land in a temp file inside `<dir>` and are
//! renamed over the target, so a reader never sees a half-written document.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::backend::{check_quota, BackendError, KeyValueStore};

const FILE_EXTENSION: &str = "json";
const MAX_KEY_LEN: usize = 128;

#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
    /// Serializes quota check + rename.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) the store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, quota_bytes: Option<usize>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("File store opened at {}", dir.display());
        Ok(Self {
            dir,
            quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Temp file in the same directory, then rename over `path`.
    fn write_document(&self, path: &Path, value: &str) -> std::io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BackendError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{FILE_EXTENSION}")))
    }

    /// Bytes held by every document except `skip`.
    fn used_bytes_excluding(&self, skip: &Path) -> Result<usize, BackendError> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            let len = fs::metadata(&path)?.len();
            total = total.saturating_add(usize::try_from(len).unwrap_or(usize::MAX));
        }
        Ok(total)
    }
}

/// A directory the process may not touch behaves like disabled storage.
fn io_error(e: std::io::Error) -> BackendError {
    if e.kind() == ErrorKind::PermissionDenied {
        BackendError::Unavailable(e.to_string())
    } else {
        BackendError::Io(e)
    }
}

/// Keys become file names, so only a conservative character set is accepted.
fn validate_key(key: &str) -> Result<(), BackendError> {
    let well_formed = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if well_formed {
        Ok(())
    } else {
        Err(BackendError::InvalidKey(key.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if self.quota_bytes.is_some() {
            let used = self.used_bytes_excluding(&path)?;
            check_quota(self.quota_bytes, used, value.len())?;
        }

        self.write_document(&path, value).map_err(io_error)?;

        debug!("file store: wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp(quota: Option<usize>) -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data"), quota).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_missing_directory() {
        let (_dir, store) = open_temp(None);
        assert!(store.dir().is_dir());
    }

    #[test]
    fn set_writes_one_json_file_per_key() {
        let (_dir, store) = open_temp(None);
        store.set("rolefit_profile", r#"{"name":"Alice"}"#).unwrap();

        let on_disk = fs::read_to_string(store.dir().join("rolefit_profile.json")).unwrap();
        assert_eq!(on_disk, r#"{"name":"Alice"}"#);
        assert_eq!(
            store.get("rolefit_profile").unwrap().as_deref(),
            Some(r#"{"name":"Alice"}"#)
        );
    }

    #[test]
    fn missing_key_reads_as_none_and_removes_cleanly() {
        let (_dir, store) = open_temp(None);
        assert_eq!(store.get("rolefit_jobs").unwrap(), None);
        store.remove("rolefit_jobs").unwrap();
    }

    #[test]
    fn remove_deletes_the_file() {
        let (_dir, store) = open_temp(None);
        store.set("rolefit_jobs", "[]").unwrap();
        store.remove("rolefit_jobs").unwrap();
        assert!(!store.dir().join("rolefit_jobs.json").exists());
        assert_eq!(store.get("rolefit_jobs").unwrap(), None);
    }

    #[test]
    fn overwrite_leaves_no_temp_files_behind() {
        let (_dir, store) = open_temp(None);
        store.set("rolefit_settings", "1").unwrap();
        store.set("rolefit_settings", "2").unwrap();

        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["rolefit_settings.json".to_string()]);
        assert_eq!(store.get("rolefit_settings").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn non_utf8_document_is_reported_as_invalid_utf8() {
        let (_dir, store) = open_temp(None);
        fs::write(store.dir().join("rolefit_jobs.json"), [0xff, 0xfe, b'{']).unwrap();
        assert!(matches!(
            store.get("rolefit_jobs"),
            Err(BackendError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let (_dir, store) = open_temp(None);
        for key in ["", "../escape", "a/b", ".hidden", "sp ace"] {
            assert!(
                matches!(store.set(key, "1"), Err(BackendError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn sentinel_key_is_accepted() {
        let (_dir, store) = open_temp(None);
        store.set("__storage_test__", "__storage_test__").unwrap();
        store.remove("__storage_test__").unwrap();
    }

    #[test]
    fn quota_counts_other_documents_only() {
        let (_dir, store) = open_temp(Some(10));
        store.set("a", "12345").unwrap();
        store.set("b", "1234").unwrap();
        // Rewriting "a" is measured against "b" alone: 6 bytes remain.
        let err = store.set("a", "1234567").unwrap_err();
        assert!(matches!(
            err,
            BackendError::QuotaExceeded {
                requested: 7,
                remaining: 6
            }
        ));
        store.set("a", "123456").unwrap();
    }
}
