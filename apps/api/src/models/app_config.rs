use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "RoleFit CV Studio";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const STORAGE_PREFIX: &str = "rolefit_";

/// Immutable app description shared with the UI. Built once in `main`, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub version: String,
    pub name: String,
    pub storage_prefix: String,
    pub storage_keys: StorageKeys,
    pub matching_thresholds: MatchingThresholds,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: APP_VERSION.to_string(),
            name: APP_NAME.to_string(),
            storage_prefix: STORAGE_PREFIX.to_string(),
            storage_keys: StorageKeys::default(),
            matching_thresholds: MatchingThresholds::default(),
        }
    }
}

/// Logical name -> key suffix (prefix not included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    pub profile: String,
    pub jobs: String,
    pub variants: String,
    pub settings: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            profile: "profile".to_string(),
            jobs: "jobs".to_string(),
            variants: "variants".to_string(),
            settings: "settings".to_string(),
        }
    }
}

/// Score cut-offs (0 – 100) the UI applies when ranking job matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingThresholds {
    pub min: u32,
    pub good: u32,
    pub excellent: u32,
}

impl Default for MatchingThresholds {
    fn default() -> Self {
        Self {
            min: 40,
            good: 60,
            excellent: 80,
        }
    }
}
