use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Which `KeyValueStore` backs the storage wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be 'file' or 'memory', got '{other}'"),
        }
    }
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub storage_backend: StorageBackend,
    pub storage_dir: PathBuf,
    /// `None` disables the quota.
    pub storage_quota_bytes: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: optional_env("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            storage_backend: optional_env("STORAGE_BACKEND")
                .map(|v| v.parse::<StorageBackend>())
                .transpose()?
                .unwrap_or(StorageBackend::File),
            storage_dir: optional_env("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            storage_quota_bytes: parse_quota(optional_env("STORAGE_QUOTA_BYTES").as_deref())?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Unset -> default quota; `0` -> no quota.
fn parse_quota(raw: Option<&str>) -> Result<Option<usize>> {
    let Some(raw) = raw else {
        return Ok(Some(DEFAULT_QUOTA_BYTES));
    };
    let bytes = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("STORAGE_QUOTA_BYTES must be a byte count, got '{raw}'"))?;
    Ok((bytes > 0).then_some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!(" Memory ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn quota_defaults_to_five_mebibytes() {
        assert_eq!(parse_quota(None).unwrap(), Some(5 * 1024 * 1024));
    }

    #[test]
    fn zero_quota_disables_limit() {
        assert_eq!(parse_quota(Some("0")).unwrap(), None);
        assert_eq!(parse_quota(Some("1024")).unwrap(), Some(1024));
    }

    #[test]
    fn garbage_quota_is_an_error() {
        let err = parse_quota(Some("lots")).unwrap_err();
        assert!(err.to_string().contains("STORAGE_QUOTA_BYTES"));
    }
}
