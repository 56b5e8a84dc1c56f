//! HTTP error mapping
//!
//! Converts pipeline errors into the JSON error envelope. Client input
//! errors keep their specific message with a 400 status; segmentation
//! failures surface as 500 with the failing stage named; anything else is
//! logged and collapsed to a generic 500 so internals never leak.

use super::models::ErrorResponse;
use crate::error::RemovalError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Terminal error response: status code plus error envelope
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// 400 with a specific client-facing message
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 404 for unmapped paths
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "Endpoint not found".to_string(),
        }
    }

    /// Generic 500; detail belongs in the log, not the response
    #[must_use]
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }

    /// Status code of this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Client-facing message of this error
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RemovalError> for ApiError {
    fn from(err: RemovalError) -> Self {
        if err.is_client_error() {
            return Self::bad_request(err.to_string());
        }
        match err {
            RemovalError::Segmentation(msg) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("Background removal failed: {msg}"),
            },
            other => {
                tracing::error!(error = %other, "Unhandled error in request pipeline");
                Self::internal()
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let err = ApiError::from(RemovalError::MissingImageData);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "No image data provided");

        let err = ApiError::from(RemovalError::invalid_base64("truncated"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid base64 image data: truncated");
    }

    #[test]
    fn test_segmentation_error_names_stage() {
        let err = ApiError::from(RemovalError::segmentation("inference failed"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Background removal failed: inference failed");
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err = ApiError::from(RemovalError::internal("session cache corrupt"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal server error");

        let err = ApiError::from(RemovalError::model("bad model file"));
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Endpoint not found");
    }
}
