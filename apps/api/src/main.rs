mod config;
mod errors;
mod models;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::models::app_config::AppConfig;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = AppConfig::default();
    info!("{} v{} initialized", app.name, app.version);

    let storage = Storage::new(build_backend(&config)?);
    if storage.is_available() {
        info!("Storage backend '{}' is available", storage.backend_name());
    } else {
        warn!(
            "Storage backend '{}' failed its availability probe; writes will fail",
            storage.backend_name()
        );
    }

    let state = AppState {
        config: config.clone(),
        app: Arc::new(app),
        storage: Arc::new(storage),
    };

    let router = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // the UI is served from a different origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Constructs the key-value backend selected by `STORAGE_BACKEND`.
fn build_backend(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let backend: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::File => Arc::new(FileStore::open(
            config.storage_dir.clone(),
            config.storage_quota_bytes,
        )?),
        StorageBackend::Memory => Arc::new(match config.storage_quota_bytes {
            Some(quota) => MemoryStore::with_quota(quota),
            None => MemoryStore::new(),
        }),
    };
    info!(
        "Storage backend: {} (quota: {})",
        backend.backend_name(),
        config
            .storage_quota_bytes
            .map(|q| format!("{q} bytes"))
            .unwrap_or_else(|| "none".to_string())
    );
    Ok(backend)
}
