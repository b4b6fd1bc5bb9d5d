use std::sync::Arc;

use crate::config::Config;
use crate::models::app_config::AppConfig;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Read-only app description served to the UI.
    pub app: Arc<AppConfig>,
    /// Storage wrapper over whichever backend `STORAGE_BACKEND` selected.
    pub storage: Arc<Storage>,
}
