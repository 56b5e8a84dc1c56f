//! Background removal processor
//!
//! The request pipeline in one place: decode input bytes, invoke the
//! segmentation backend, wrap the transparent bitmap in a [`RemovalResult`].
//! Stateless across requests; every call works on its own buffers.

use crate::error::Result;
use crate::inference::SegmentationBackend;
use crate::types::{ProcessingTimings, RemovalResult};
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, instrument};

/// Pipeline driver around a segmentation backend
pub struct BackgroundRemovalProcessor {
    backend: Box<dyn SegmentationBackend>,
}

impl std::fmt::Debug for BackgroundRemovalProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRemovalProcessor")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl BackgroundRemovalProcessor {
    /// Create a processor around the given backend
    #[must_use]
    pub fn new(backend: Box<dyn SegmentationBackend>) -> Self {
        Self { backend }
    }

    /// Name of the underlying backend
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Process raw image bytes: decode, then remove the background
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Image` when the bytes are not a decodable
    /// raster image, and `RemovalError::Segmentation` when the backend fails.
    #[instrument(skip(self, image_bytes), fields(backend = self.backend.name(), input_len = image_bytes.len()))]
    pub fn process_bytes(&self, image_bytes: &[u8]) -> Result<RemovalResult> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let image = image::load_from_memory(image_bytes)?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        self.process_decoded(&image, decode_ms, total_start)
    }

    /// Process an already-decoded image
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Segmentation` when the backend fails.
    pub fn process_image(&self, image: &DynamicImage) -> Result<RemovalResult> {
        self.process_decoded(image, 0, Instant::now())
    }

    fn process_decoded(
        &self,
        image: &DynamicImage,
        decode_ms: u64,
        total_start: Instant,
    ) -> Result<RemovalResult> {
        let original_dimensions = (image.width(), image.height());

        let inference_start = Instant::now();
        let result_image = self.backend.remove_background(image)?;
        let inference_ms = inference_start.elapsed().as_millis() as u64;

        let timings = ProcessingTimings {
            decode_ms,
            inference_ms,
            total_ms: total_start.elapsed().as_millis() as u64,
        };
        debug!(
            width = original_dimensions.0,
            height = original_dimensions.1,
            decode_ms,
            inference_ms,
            "background removal complete"
        );

        Ok(RemovalResult::new(result_image, original_dimensions, timings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255u8, 255, 255])
            } else {
                Rgb([0u8, 0, 0])
            }
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .unwrap();
        buffer
    }

    #[test]
    fn test_process_bytes_produces_rgba() {
        let processor = BackgroundRemovalProcessor::new(Box::new(MockBackend::new()));
        let result = processor.process_bytes(&png_bytes(8, 8)).unwrap();
        assert_eq!(result.original_dimensions, (8, 8));
        assert_eq!(result.image.color(), image::ColorType::Rgba8);
    }

    #[test]
    fn test_process_bytes_rejects_garbage() {
        let processor = BackgroundRemovalProcessor::new(Box::new(MockBackend::new()));
        let result = processor.process_bytes(b"definitely not an image");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .starts_with("Invalid image format"));
    }

    #[test]
    fn test_backend_name_passthrough() {
        let processor = BackgroundRemovalProcessor::new(Box::new(MockBackend::new()));
        assert_eq!(processor.backend_name(), "mock");
    }
}
