pub mod health;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::state::AppState;
use crate::storage::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/config", get(health::config_handler))
        // Storage API
        .route(
            "/api/v1/storage/available",
            get(handlers::handle_availability),
        )
        .route("/api/v1/storage", delete(handlers::handle_clear))
        .route(
            "/api/v1/storage/:key",
            get(handlers::handle_load)
                .put(handlers::handle_save)
                .patch(handlers::handle_merge)
                .delete(handlers::handle_remove),
        )
        .with_state(state)
}
