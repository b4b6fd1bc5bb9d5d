use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::{Storage, StorageError};

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub backend: &'static str,
}

/// Runs a blocking storage call off the async executor.
async fn run_blocking<T, F>(storage: Arc<Storage>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Storage) -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&storage))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in storage call: {e}")))?
        .map_err(AppError::from)
}

/// GET /api/v1/storage/available
pub async fn handle_availability(
    State(state): State<AppState>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let backend = state.storage.backend_name();
    let available = run_blocking(state.storage, |s| Ok(s.is_available())).await?;
    Ok(Json(AvailabilityResponse { available, backend }))
}

/// GET /api/v1/storage/:key
pub async fn handle_load(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let lookup = key.clone();
    let value = run_blocking(state.storage, move |s| s.load::<Value>(&lookup)).await?;
    value
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No value stored under '{key}'")))
}

/// PUT /api/v1/storage/:key
pub async fn handle_save(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode, AppError> {
    run_blocking(state.storage, move |s| s.save(&key, &value)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/storage/:key
///
/// Shallow-merges the body's fields into the stored object.
pub async fn handle_merge(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let Value::Object(patch) = patch else {
        return Err(AppError::Validation(
            "PATCH body must be a JSON object".to_string(),
        ));
    };
    let merged = run_blocking(state.storage, move |s| {
        s.update(&key, |current: Option<Value>| merge_object(current, patch))
    })
    .await?;
    Ok(Json(merged))
}

/// DELETE /api/v1/storage/:key
pub async fn handle_remove(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    run_blocking(state.storage, move |s| s.remove(&key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/storage
pub async fn handle_clear(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    run_blocking(state.storage, |s| s.clear()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Top-level fields of `patch` win; a missing or non-object current value is replaced.
fn merge_object(current: Option<Value>, patch: Map<String, Value>) -> Value {
    match current {
        Some(Value::Object(mut existing)) => {
            existing.extend(patch);
            Value::Object(existing)
        }
        _ => Value::Object(patch),
    }
}
