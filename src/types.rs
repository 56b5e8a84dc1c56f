//! Core types for background removal operations

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, GenericImageView, ImageBuffer, RgbaImage};

/// Per-pixel foreground confidence, 0 (background) to 255 (foreground)
#[derive(Debug, Clone)]
pub struct SegmentationMask {
    /// Mask values in row-major order
    pub data: Vec<u8>,
    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Apply this mask to an image, producing an RGBA bitmap whose alpha
    /// channel is the mask value
    ///
    /// Pixels with zero mask value become fully transparent black; all others
    /// keep their color with the mask as alpha. Pixels outside the mask (on a
    /// dimension mismatch) are treated as background.
    #[must_use]
    pub fn apply_to(&self, image: &DynamicImage) -> RgbaImage {
        let rgba_image = image.to_rgba8();
        let (width, height) = rgba_image.dimensions();
        let mut result = ImageBuffer::new(width, height);

        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let pixel_index = (y * width + x) as usize;
            let alpha = self.data.get(pixel_index).copied().unwrap_or(0);

            if alpha > 0 {
                result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
            } else {
                result.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
            }
        }

        result
    }

    /// Fraction of pixels classified as foreground (mask value > 127)
    #[must_use]
    pub fn foreground_ratio(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&v| v > 127).count();
        foreground as f64 / self.data.len() as f64
    }
}

/// Stage timings for a single removal operation, in milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingTimings {
    /// Input decode time
    pub decode_ms: u64,
    /// Segmentation backend time
    pub inference_ms: u64,
    /// Total pipeline time
    pub total_ms: u64,
}

/// Result of a background removal operation
#[derive(Debug, Clone)]
pub struct RemovalResult {
    /// The processed image with background removed (always carries alpha)
    pub image: DynamicImage,
    /// Original image dimensions
    pub original_dimensions: (u32, u32),
    /// Stage timings
    pub timings: ProcessingTimings,
}

impl RemovalResult {
    /// Create a new removal result
    #[must_use]
    pub fn new(
        image: RgbaImage,
        original_dimensions: (u32, u32),
        timings: ProcessingTimings,
    ) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
            original_dimensions,
            timings,
        }
    }

    /// Encode the result as PNG bytes with alpha channel
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Image` on encoding failures.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image.write_to(&mut cursor, image::ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Encode the result as a `data:image/png;base64,` data URL
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Image` on encoding failures.
    pub fn to_data_url(&self) -> Result<String> {
        let png_bytes = self.to_png_bytes()?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(png_bytes)))
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 100, 50]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_mask_apply_alpha() {
        let image = solid_image(2, 2);
        // Top row foreground, bottom row background
        let mask = SegmentationMask::new(vec![255, 128, 0, 0], (2, 2));
        let result = mask.apply_to(&image);

        assert_eq!(result.get_pixel(0, 0).0, [200, 100, 50, 255]);
        assert_eq!(result.get_pixel(1, 0).0, [200, 100, 50, 128]);
        assert_eq!(result.get_pixel(0, 1).0, [0, 0, 0, 0]);
        assert_eq!(result.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_mask_shorter_than_image_is_background() {
        let image = solid_image(2, 2);
        let mask = SegmentationMask::new(vec![255], (1, 1));
        let result = mask.apply_to(&image);

        assert_eq!(result.get_pixel(0, 0).0[3], 255);
        assert_eq!(result.get_pixel(1, 1).0[3], 0);
    }

    #[test]
    fn test_foreground_ratio() {
        let mask = SegmentationMask::new(vec![255, 255, 0, 0], (2, 2));
        assert!((mask.foreground_ratio() - 0.5).abs() < f64::EPSILON);

        let empty = SegmentationMask::new(Vec::new(), (0, 0));
        assert!(empty.foreground_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn test_png_roundtrip_keeps_alpha() {
        let image = solid_image(4, 4);
        let mask = SegmentationMask::new(vec![255; 16], (4, 4));
        let result = RemovalResult::new(mask.apply_to(&image), (4, 4), ProcessingTimings::default());

        let png = result.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgba8);
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn test_data_url_prefix_and_payload() {
        let image = solid_image(2, 2);
        let mask = SegmentationMask::new(vec![255; 4], (2, 2));
        let result = RemovalResult::new(mask.apply_to(&image), (2, 2), ProcessingTimings::default());

        let url = result.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let payload = url.split_once(',').unwrap().1;
        let bytes = BASE64.decode(payload).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
