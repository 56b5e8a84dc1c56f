//! Router assembly and middleware stack

use super::error::ApiError;
use super::{handlers, AppState};
use crate::config::ServiceConfig;
use crate::processor::BackgroundRemovalProcessor;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the service router with its middleware stack
///
/// Layers, outermost first: request tracing, panic boundary (so an
/// unclassified failure still produces the JSON 500 envelope), CORS
/// allow-list, body size cap.
pub fn create_app(config: &ServiceConfig, processor: Arc<BackgroundRemovalProcessor>) -> Router {
    let state = AppState { processor };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/remove-background", post(handlers::remove_background))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.max_image_size_bytes))
        .layer(cors_layer(config))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Cross-origin policy: fixed origin allow-list, GET/POST, content-type header
fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Skipping unparseable CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Panic boundary: log the detail, answer with the generic 500 envelope
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal().into_response()
}
