//! JSON request and response envelopes

use serde::{Deserialize, Serialize};

/// `GET /health` response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Successful `POST /remove-background` response body
#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub success: bool,
    /// `data:image/png;base64,…` data URL of the transparent result
    pub image: String,
    pub format: &'static str,
}

/// Error envelope shared by all failure responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// `POST /remove-background` JSON request body
///
/// `image` holds raw base64 or a `data:image/…;base64,` data URL. The key is
/// optional so that its absence maps to the dedicated error message instead
/// of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RemoveBackgroundRequest {
    pub image: Option<String>,
}
