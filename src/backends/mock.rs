//! Mock backend implementation for testing and debugging
//!
//! Uses a simple luminance edge-detection heuristic as a stand-in
//! segmentation mask, useful for exercising the full pipeline without a
//! model file.

use crate::error::{RemovalError, Result};
use crate::inference::SegmentationBackend;
use crate::types::SegmentationMask;
use image::{DynamicImage, GenericImageView, RgbaImage};

/// Edge strength above which a pixel counts as foreground
const EDGE_THRESHOLD: f32 = 0.1;

/// Mock segmentation backend
///
/// Deterministic: the same input always produces the same mask.
#[derive(Debug, Default)]
pub struct MockBackend;

impl MockBackend {
    /// Create a new mock backend
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build an edge-strength mask over the image luminance
    fn edge_mask(image: &DynamicImage) -> SegmentationMask {
        let luma = image.to_luma32f();
        let (width, height) = luma.dimensions();
        let mut data = vec![0u8; (width as usize) * (height as usize)];

        // Border pixels stay background; a 1px margin keeps neighbor reads in bounds
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let center = luma.get_pixel(x, y).0[0];
                let left = luma.get_pixel(x - 1, y).0[0];
                let right = luma.get_pixel(x + 1, y).0[0];
                let top = luma.get_pixel(x, y - 1).0[0];
                let bottom = luma.get_pixel(x, y + 1).0[0];

                let edge_strength = ((center - left).abs()
                    + (center - right).abs()
                    + (center - top).abs()
                    + (center - bottom).abs())
                    / 4.0;

                if edge_strength > EDGE_THRESHOLD {
                    if let Some(elem) = data.get_mut((y * width + x) as usize) {
                        *elem = 255;
                    }
                }
            }
        }

        SegmentationMask::new(data, (width, height))
    }
}

impl SegmentationBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RemovalError::segmentation("input image has zero pixels"));
        }

        let mask = Self::edge_mask(image);
        Ok(mask.apply_to(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn checkerboard(size: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255u8, 255, 255])
            } else {
                Rgb([0u8, 0, 0])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_output_matches_input_dimensions() {
        let backend = MockBackend::new();
        let image = checkerboard(8);
        let result = backend.remove_background(&image).unwrap();
        assert_eq!(result.dimensions(), (8, 8));
    }

    #[test]
    fn test_flat_image_is_all_background() {
        let backend = MockBackend::new();
        let img = ImageBuffer::from_pixel(8, 8, Rgb([120u8, 120, 120]));
        let result = backend
            .remove_background(&DynamicImage::ImageRgb8(img))
            .unwrap();
        assert!(result.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_high_contrast_image_has_foreground() {
        let backend = MockBackend::new();
        let result = backend.remove_background(&checkerboard(8)).unwrap();
        assert!(result.pixels().any(|p| p.0[3] == 255));
    }

    #[test]
    fn test_deterministic() {
        let backend = MockBackend::new();
        let image = checkerboard(8);
        let a = backend.remove_background(&image).unwrap();
        let b = backend.remove_background(&image).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
