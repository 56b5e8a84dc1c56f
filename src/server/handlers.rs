//! Request handlers

use super::error::ApiError;
use super::extract::ImagePayload;
use super::models::{HealthResponse, RemovalResponse};
use super::{AppState, SERVICE_NAME};
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// `GET /health`
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /remove-background`
///
/// Decode the payload, run the segmentation pipeline off the async runtime
/// (the model call is CPU/GPU-bound and blocking), and wrap the transparent
/// PNG in the success envelope.
pub(super) async fn remove_background(
    State(state): State<AppState>,
    payload: ImagePayload,
) -> Result<Json<RemovalResponse>, ApiError> {
    let image_bytes = payload.into_bytes()?;

    let processor = Arc::clone(&state.processor);
    let data_url = tokio::task::spawn_blocking(move || {
        let result = processor.process_bytes(&image_bytes)?;
        result.to_data_url()
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Background removal task failed to complete");
        ApiError::internal()
    })??;

    Ok(Json(RemovalResponse {
        success: true,
        image: data_url,
        format: "png",
    }))
}

/// Fallback for unmapped paths
pub(super) async fn not_found() -> ApiError {
    ApiError::not_found()
}
