#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Service
//!
//! A small HTTP microservice that removes image backgrounds. A request
//! carries an image (multipart upload or base64/data-URL JSON), the service
//! decodes it, invokes a segmentation backend to produce an image with
//! alpha-channel transparency where background was detected, re-encodes the
//! result as PNG, and returns it as a base64 data URL inside a JSON
//! envelope.
//!
//! The segmentation model is the only non-portable dependency and sits
//! behind the [`SegmentationBackend`] trait; the default implementation runs
//! ISNet-style matting models through ONNX Runtime (feature `onnx`, enabled
//! by default), and a deterministic [`MockBackend`] keeps the full pipeline
//! exercisable without a model file.
//!
//! ## HTTP surface
//!
//! | Method | Path                 | Success                                             |
//! |--------|----------------------|-----------------------------------------------------|
//! | GET    | `/health`            | `{status, service, version}`                        |
//! | POST   | `/remove-background` | `{success, image: "data:image/png;base64,…", format}` |
//!
//! Failures answer `{success: false, error: <message>}` with a 400 status
//! for client input errors, 500 for processing failures, and 404 for
//! unmapped paths.
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use bgremove_service::{remove_background_from_bytes, ServiceConfig};
//!
//! # fn example(upload_bytes: Vec<u8>) -> bgremove_service::Result<()> {
//! let config = ServiceConfig::default();
//! let result = remove_background_from_bytes(&upload_bytes, &config)?;
//! let data_url = result.to_data_url()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Running the server
//!
//! ```rust,no_run
//! use bgremove_service::{backends, server, BackgroundRemovalProcessor, ServiceConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::from_env();
//! let backend = backends::create_backend(&config)?;
//! let processor = Arc::new(BackgroundRemovalProcessor::new(backend));
//! server::serve(&config, processor).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod processor;
pub mod server;
pub mod tracing_config;
pub mod types;

// Public API exports
#[cfg(feature = "onnx")]
pub use backends::OnnxBackend;
pub use backends::{create_backend, MockBackend};
pub use config::{BackendKind, ExecutionProvider, ServiceConfig, ServiceConfigBuilder};
pub use error::{RemovalError, Result};
pub use inference::SegmentationBackend;
pub use processor::BackgroundRemovalProcessor;
pub use server::{create_app, serve, ApiError, ImagePayload};
pub use tracing_config::{TracingConfig, TracingFormat};
pub use types::{ProcessingTimings, RemovalResult, SegmentationMask};

/// Remove the background from an image provided as bytes
///
/// Convenience wrapper for one-shot, memory-based processing: builds the
/// backend selected by `config`, decodes `image_bytes`, and runs the
/// pipeline. Servers that handle many requests should construct the backend
/// once and reuse a [`BackgroundRemovalProcessor`] instead.
///
/// # Errors
///
/// Returns `RemovalError::Image` when the bytes are not a decodable raster
/// image, `RemovalError::Segmentation` when the backend fails, and
/// configuration/model errors from backend construction.
pub fn remove_background_from_bytes(
    image_bytes: &[u8],
    config: &ServiceConfig,
) -> Result<RemovalResult> {
    let backend = create_backend(config)?;
    BackgroundRemovalProcessor::new(backend).process_bytes(image_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_pipeline() {
        let img = image::RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();

        let config = ServiceConfig::default();
        let result = remove_background_from_bytes(&bytes, &config).unwrap();
        assert_eq!(result.original_dimensions, (8, 8));
        assert!(result.to_data_url().unwrap().starts_with("data:image/png;base64,"));
    }
}
