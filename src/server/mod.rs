//! Presets service: hosts the shared `presets` document collection.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sessions that share presets publish them here and students list them
//! from here. The collection lives in memory for request handling and is
//! flushed to a JSON snapshot file by a background task, and once more on
//! shutdown.

pub mod persistence;
pub mod presets;

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::remote::MemoryRemote;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Snapshot(#[from] persistence::SnapshotError),
}

/// Shared state injected into handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub documents: MemoryRemote,
}

impl AppState {
    #[must_use]
    pub fn new(documents: MemoryRemote) -> Self {
        Self { documents }
    }
}

/// Router for the presets API.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/presets", get(presets::list_presets).post(presets::create_preset))
        .route("/api/presets/{id}", get(presets::get_preset))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Load the snapshot, start the flush task, and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the snapshot is unreadable, the port cannot be bound,
/// or the final flush fails.
pub async fn serve(config: &AppConfig) -> Result<(), ServerError> {
    let documents = persistence::load_snapshot(&config.server_snapshot).await?;
    info!(count = documents.len(), path = %config.server_snapshot.display(), "loaded presets snapshot");

    let state = AppState::new(MemoryRemote::from_documents(documents));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "presets service listening");
    serve_until(listener, state, config.server_snapshot.clone(), config.flush_interval_ms, ctrl_c()).await
}

/// Serve on `listener` until `shutdown` resolves, then write any documents
/// the periodic flush has not yet persisted.
///
/// # Errors
///
/// Returns an error if serving or the final flush fails.
pub async fn serve_until(
    listener: tokio::net::TcpListener,
    state: AppState,
    snapshot: PathBuf,
    flush_interval_ms: u64,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let flusher = persistence::spawn_persistence_task(state.documents.clone(), snapshot.clone(), flush_interval_ms);

    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await?;

    flusher.abort();
    if persistence::flush_if_dirty(&state.documents, &snapshot).await? {
        info!(path = %snapshot.display(), "presets snapshot written on shutdown");
    }
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "ctrl-c handler unavailable; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
