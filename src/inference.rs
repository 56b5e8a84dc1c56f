//! Segmentation backend abstraction
//!
//! The segmentation model is the only non-portable dependency of this
//! service, so it sits behind a single-operation capability trait. Any
//! implementation (ONNX session, remote inference service, heuristic) can be
//! substituted as long as it honors the `bitmap in → bitmap out with alpha`
//! contract and reports failure as one error kind.

use crate::error::Result;
use image::{DynamicImage, RgbaImage};

/// Trait for segmentation backends
///
/// Implementations classify foreground vs. background pixels and return the
/// input image with an alpha channel marking removed background as
/// transparent.
pub trait SegmentationBackend: Send + Sync {
    /// Backend name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Remove the background from `image`
    ///
    /// The returned bitmap has the same dimensions as the input, with
    /// background pixels fully transparent.
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Segmentation` for any backend failure (model
    /// error, unsupported input, resource exhaustion).
    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage>;
}
