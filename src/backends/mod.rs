//! Backend implementations for the segmentation capability
//!
//! - ONNX Runtime backend (feature `onnx`): real model inference
//! - Mock backend (always available): deterministic heuristic for tests,
//!   debugging and model-less deployments

#[cfg(feature = "onnx")]
pub mod onnx;

pub mod mock;

#[cfg(feature = "onnx")]
pub use self::onnx::OnnxBackend;

pub use self::mock::MockBackend;

use crate::config::{BackendKind, ServiceConfig};
use crate::error::Result;
use crate::inference::SegmentationBackend;

/// Construct the segmentation backend selected by the configuration
///
/// # Errors
///
/// Returns `RemovalError::InvalidConfig` when the ONNX backend is selected
/// without the `onnx` feature or a model path, and `RemovalError::Model` for
/// model loading failures.
pub fn create_backend(config: &ServiceConfig) -> Result<Box<dyn SegmentationBackend>> {
    match config.resolved_backend() {
        BackendKind::Onnx => create_onnx_backend(config),
        BackendKind::Auto | BackendKind::Mock => Ok(Box::new(MockBackend::new())),
    }
}

#[cfg(feature = "onnx")]
fn create_onnx_backend(config: &ServiceConfig) -> Result<Box<dyn SegmentationBackend>> {
    let path = config.model_path.as_ref().ok_or_else(|| {
        crate::error::RemovalError::invalid_config("ONNX backend requires a model path")
    })?;
    Ok(Box::new(OnnxBackend::from_file(path, config)?))
}

#[cfg(not(feature = "onnx"))]
fn create_onnx_backend(_config: &ServiceConfig) -> Result<Box<dyn SegmentationBackend>> {
    Err(crate::error::RemovalError::invalid_config(
        "ONNX backend requested but this build has the 'onnx' feature disabled",
    ))
}
