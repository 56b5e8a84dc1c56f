//! HTTP server module
//!
//! Exposes the background-removal endpoint and health check, maps pipeline
//! errors to the JSON error envelope, and applies the cross-origin policy.

mod app;
mod error;
mod extract;
mod handlers;
mod models;

pub use app::create_app;
pub use error::ApiError;
pub use extract::ImagePayload;
pub use models::{ErrorResponse, HealthResponse, RemovalResponse, RemoveBackgroundRequest};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::processor::BackgroundRemovalProcessor;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "background-removal";

/// Shared per-request state
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) processor: Arc<BackgroundRemovalProcessor>,
}

/// Bind and run the service until shutdown
///
/// # Errors
///
/// Returns `RemovalError::Io` when the listener cannot bind or the server
/// fails while running.
pub async fn serve(config: &ServiceConfig, processor: Arc<BackgroundRemovalProcessor>) -> Result<()> {
    let app = create_app(config, processor);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(port = config.port, "Background removal service starting");
    info!("Health check: http://localhost:{}/health", config.port);
    info!(
        "Remove background: http://localhost:{}/remove-background",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
