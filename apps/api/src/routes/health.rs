use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::models::app_config::AppConfig;
use crate::state::AppState;

/// GET /health
/// Returns service status, app version, and the last storage availability probe.
/// Never writes to the backend; `GET /api/v1/storage/available` re-probes.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let storage_available = state.storage.last_probe();

    Json(json!({
        "status": "ok",
        "version": state.app.version,
        "service": "rolefit-api",
        "storage_backend": state.storage.backend_name(),
        "storage_quota_bytes": state.config.storage_quota_bytes,
        "storage_available": storage_available
    }))
}

/// GET /api/v1/config
pub async fn config_handler(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.app.as_ref().clone())
}
