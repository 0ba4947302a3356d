// rollcall - attendance check-in HTTP server
//
// One endpoint receives a (name, status) form submission and appends a
// timestamped row to the current month's sheet in object storage, creating
// the sheet with a header row on first use.
//
// Features:
// - Axum HTTP server (HTTP/1.1, HTTP/2)
// - Multi-backend storage (Filesystem, S3, in-memory)
// - Structured logging with tracing
// - Graceful shutdown

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
pub mod error;
pub mod partition;
pub mod store;

mod handlers;
mod init;

use config::RuntimeConfig;
use handlers::{handle_checkin, health_check, ready_check};
use store::Store;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

/// Build the application router. Exposed for integration tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/checkin", post(handle_checkin))
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

/// Run the server with a resolved configuration.
pub async fn run_with_config(config: RuntimeConfig) -> Result<()> {
    init::init_tracing(&config.server);

    let operator = init::init_operator(&config.storage)?;
    let store = Arc::new(Store::new(operator));
    let state = AppState { store };

    let addr = config.server.listen_addr.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("Check-in endpoint listening on http://{}", addr);
    info!("Routes:");
    info!("  POST http://{}/v1/checkin - attendance check-in", addr);
    info!("  GET  http://{}/health     - health check", addr);
    info!("  GET  http://{}/ready      - readiness check", addr);
    info!("Press Ctrl+C or send SIGTERM to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
