//! Error types for the background removal service

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Error types for the request pipeline and its collaborators
///
/// The first group maps one-to-one onto the client-visible failure conditions
/// of the HTTP contract; the second group covers configuration, model and
/// unexpected internal failures, which are never surfaced verbatim.
#[derive(Error, Debug)]
pub enum RemovalError {
    /// Request body is neither a multipart upload nor a JSON image payload
    #[error("Invalid request format. Send multipart/form-data or JSON with base64 image")]
    InvalidRequestFormat,

    /// Multipart `image` field present but carries an empty filename
    #[error("No file selected")]
    NoFileSelected,

    /// JSON body parsed but the `image` key is missing
    #[error("No image data provided")]
    MissingImageData,

    /// Base64 payload could not be decoded
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),

    /// Neither input path produced any bytes
    #[error("No image data received")]
    EmptyImageData,

    /// Bytes obtained but not decodable as a supported raster format
    #[error("Invalid image format: {0}")]
    Image(#[from] image::ImageError),

    /// The segmentation backend failed
    #[error("Background removal failed: {0}")]
    Segmentation(String),

    /// Input/output errors (model file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Model loading or initialization errors
    #[error("Model error: {0}")]
    Model(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RemovalError {
    /// Create a new invalid base64 error
    pub fn invalid_base64<S: Into<String>>(msg: S) -> Self {
        Self::InvalidBase64(msg.into())
    }

    /// Create a new segmentation error
    pub fn segmentation<S: Into<String>>(msg: S) -> Self {
        Self::Segmentation(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new model error
    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error was caused by the client's input
    ///
    /// Client input errors surface with their full message and a 400 status;
    /// everything else is a server-side failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequestFormat
                | Self::NoFileSelected
                | Self::MissingImageData
                | Self::InvalidBase64(_)
                | Self::EmptyImageData
                | Self::Image(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RemovalError::segmentation("model exploded");
        assert!(matches!(err, RemovalError::Segmentation(_)));

        let err = RemovalError::invalid_config("bad port");
        assert!(matches!(err, RemovalError::InvalidConfig(_)));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            RemovalError::MissingImageData.to_string(),
            "No image data provided"
        );
        assert_eq!(RemovalError::NoFileSelected.to_string(), "No file selected");
        assert_eq!(
            RemovalError::EmptyImageData.to_string(),
            "No image data received"
        );
        assert_eq!(
            RemovalError::invalid_base64("bad padding").to_string(),
            "Invalid base64 image data: bad padding"
        );
        assert_eq!(
            RemovalError::segmentation("inference failed").to_string(),
            "Background removal failed: inference failed"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RemovalError::InvalidRequestFormat.is_client_error());
        assert!(RemovalError::NoFileSelected.is_client_error());
        assert!(RemovalError::MissingImageData.is_client_error());
        assert!(RemovalError::invalid_base64("x").is_client_error());
        assert!(RemovalError::EmptyImageData.is_client_error());

        assert!(!RemovalError::segmentation("x").is_client_error());
        assert!(!RemovalError::internal("x").is_client_error());
        assert!(!RemovalError::invalid_config("x").is_client_error());
    }
}
