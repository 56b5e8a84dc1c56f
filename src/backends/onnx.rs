//! ONNX Runtime backend implementation for segmentation models
//!
//! Runs an ISNet-style matting model: aspect-preserving resize and NCHW
//! normalization on the way in, inverse-transform of the predicted mask on
//! the way out, mask applied as the alpha channel of the original image.

use crate::config::{ExecutionProvider, ServiceConfig};
use crate::error::{RemovalError, Result};
use crate::inference::SegmentationBackend;
use crate::types::SegmentationMask;
use image::{DynamicImage, GenericImageView, ImageBuffer, RgbaImage};
use ndarray::Array4;
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider as OrtExecutionProvider,
    ExecutionProviderDispatch,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

/// Model input geometry and normalization constants
#[derive(Debug, Clone)]
pub struct PreprocessingConfig {
    /// Square model input size in pixels
    pub target_size: u32,
    /// Per-channel normalization mean (RGB)
    pub normalization_mean: [f32; 3],
    /// Per-channel normalization std (RGB)
    pub normalization_std: [f32; 3],
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        // ISNet defaults
        Self {
            target_size: 1024,
            normalization_mean: [0.485, 0.456, 0.406],
            normalization_std: [0.229, 0.224, 0.225],
        }
    }
}

/// Mapping between model-input coordinates and original-image coordinates
#[derive(Debug, Clone)]
struct CoordinateTransformation {
    scale: f32,
    offset_x: u32,
    offset_y: u32,
    mask_width: u32,
    mask_height: u32,
}

/// ONNX Runtime backend for running segmentation models
///
/// The session is shared across requests behind a mutex; inference serializes
/// on it.
pub struct OnnxBackend {
    session: Mutex<Session>,
    preprocessing: PreprocessingConfig,
}

impl std::fmt::Debug for OnnxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxBackend")
            .field("preprocessing", &self.preprocessing)
            .finish_non_exhaustive()
    }
}

impl OnnxBackend {
    /// Load a model file and build an inference session
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::Io` when the model file cannot be read and
    /// `RemovalError::Model` for session construction failures.
    pub fn from_file<P: AsRef<Path>>(path: P, config: &ServiceConfig) -> Result<Self> {
        Self::with_preprocessing(path, config, PreprocessingConfig::default())
    }

    /// Load a model file with custom preprocessing constants
    ///
    /// # Errors
    ///
    /// Same conditions as [`OnnxBackend::from_file`].
    pub fn with_preprocessing<P: AsRef<Path>>(
        path: P,
        config: &ServiceConfig,
        preprocessing: PreprocessingConfig,
    ) -> Result<Self> {
        let load_start = std::time::Instant::now();
        let path = path.as_ref();
        let model_data = std::fs::read(path).map_err(|e| {
            RemovalError::model(format!("Failed to read model '{}': {e}", path.display()))
        })?;

        let intra_threads = if config.threads > 0 {
            config.threads
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(8)
        };
        let inter_threads = (intra_threads / 4).max(1);

        let session = Session::builder()
            .map_err(|e| RemovalError::model(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| RemovalError::model(format!("Failed to set optimization level: {e}")))?
            .with_execution_providers(Self::select_providers(config.execution_provider))
            .map_err(|e| RemovalError::model(format!("Failed to set execution providers: {e}")))?
            .with_parallel_execution(true)
            .map_err(|e| RemovalError::model(format!("Failed to enable parallel execution: {e}")))?
            .with_intra_threads(intra_threads)
            .map_err(|e| RemovalError::model(format!("Failed to set intra threads: {e}")))?
            .with_inter_threads(inter_threads)
            .map_err(|e| RemovalError::model(format!("Failed to set inter threads: {e}")))?
            .commit_from_memory(&model_data)
            .map_err(|e| {
                RemovalError::model(format!(
                    "Failed to create session from '{}': {e}",
                    path.display()
                ))
            })?;

        tracing::info!(
            model = %path.display(),
            size_mb = model_data.len() as f64 / (1024.0 * 1024.0),
            load_ms = load_start.elapsed().as_millis() as u64,
            intra_threads,
            inter_threads,
            "ONNX session created"
        );

        Ok(Self {
            session: Mutex::new(session),
            preprocessing,
        })
    }

    /// Pick execution providers for the session, availability-checked
    fn select_providers(provider: ExecutionProvider) -> Vec<ExecutionProviderDispatch> {
        let mut providers = Vec::new();
        match provider {
            ExecutionProvider::Auto => {
                // Priority order: CUDA > CoreML > CPU (implicit fallback)
                let cuda = CUDAExecutionProvider::default();
                if OrtExecutionProvider::is_available(&cuda).unwrap_or(false) {
                    tracing::info!("CUDA execution provider available, using it");
                    providers.push(cuda.build());
                }
                let coreml = CoreMLExecutionProvider::default().with_subgraphs(true);
                if OrtExecutionProvider::is_available(&coreml).unwrap_or(false) {
                    tracing::info!("CoreML execution provider available, using it");
                    providers.push(coreml.build());
                }
            },
            ExecutionProvider::Cuda => {
                let cuda = CUDAExecutionProvider::default();
                if OrtExecutionProvider::is_available(&cuda).unwrap_or(false) {
                    providers.push(cuda.build());
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                }
            },
            ExecutionProvider::CoreMl => {
                let coreml = CoreMLExecutionProvider::default().with_subgraphs(true);
                if OrtExecutionProvider::is_available(&coreml).unwrap_or(false) {
                    providers.push(coreml.build());
                } else {
                    tracing::warn!("CoreML requested but not available, falling back to CPU");
                }
            },
            ExecutionProvider::Cpu => {},
        }
        providers
    }

    /// Convert an image to a normalized NCHW tensor
    ///
    /// RGB convert, aspect-preserving resize, center pad on a white canvas,
    /// then per-channel normalization.
    fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        let target_size = self.preprocessing.target_size;
        let rgb_image = image.to_rgb8();
        let (orig_width, orig_height) = rgb_image.dimensions();

        let target_size_f32 = target_size as f32;
        let scale = (target_size_f32 / orig_width as f32).min(target_size_f32 / orig_height as f32);

        let new_width = (orig_width as f32 * scale).round() as u32;
        let new_height = (orig_height as f32 * scale).round() as u32;
        if new_width == 0 || new_height == 0 {
            return Err(RemovalError::segmentation(
                "input image collapses to zero pixels at model resolution",
            ));
        }

        let resized = image::imageops::resize(
            &rgb_image,
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );

        let mut canvas = ImageBuffer::from_pixel(target_size, target_size, image::Rgb([255u8; 3]));
        let offset_x = (target_size - new_width) / 2;
        let offset_y = (target_size - new_height) / 2;
        for (x, y, pixel) in resized.enumerate_pixels() {
            let canvas_x = x + offset_x;
            let canvas_y = y + offset_y;
            if canvas_x < target_size && canvas_y < target_size {
                canvas.put_pixel(canvas_x, canvas_y, *pixel);
            }
        }

        let size = target_size as usize;
        let mean = self.preprocessing.normalization_mean;
        let std = self.preprocessing.normalization_std;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

        #[allow(clippy::indexing_slicing)]
        // Tensor dimensions are pre-allocated to match the canvas size
        for (y, row) in canvas.rows().enumerate() {
            for (x, pixel) in row.enumerate() {
                tensor[[0, 0, y, x]] = (f32::from(pixel[0]) / 255.0 - mean[0]) / std[0];
                tensor[[0, 1, y, x]] = (f32::from(pixel[1]) / 255.0 - mean[1]) / std[1];
                tensor[[0, 2, y, x]] = (f32::from(pixel[2]) / 255.0 - mean[2]) / std[2];
            }
        }

        Ok(tensor)
    }

    /// Run the model on a preprocessed tensor
    fn infer(&self, input: &Array4<f32>) -> Result<Array4<f32>> {
        let input_value = Value::from_array(input.clone())
            .map_err(|e| RemovalError::segmentation(format!("Failed to convert input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| RemovalError::segmentation("inference session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| RemovalError::segmentation(format!("ONNX inference failed: {e}")))?;

        // Positional output access: first output is the mask
        let first_key = outputs
            .keys()
            .next()
            .ok_or_else(|| RemovalError::segmentation("model produced no outputs"))?;
        let view = outputs
            .get(first_key)
            .ok_or_else(|| RemovalError::segmentation("first output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| RemovalError::segmentation(format!("Failed to extract output tensor: {e}")))?;

        view.to_owned()
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|e| RemovalError::segmentation(format!("Unexpected output tensor shape: {e}")))
    }

    /// Convert the output tensor back to a mask in original-image coordinates
    fn tensor_to_mask(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
    ) -> Result<SegmentationMask> {
        let shape = tensor.shape();
        if shape.first().copied().unwrap_or(0) != 1 || shape.get(1).copied().unwrap_or(0) != 1 {
            return Err(RemovalError::segmentation(format!(
                "invalid output tensor shape {shape:?}, expected [1, 1, H, W]"
            )));
        }

        let transformation = Self::inverse_transformation(tensor, original_dimensions);
        let (orig_width, orig_height) = original_dimensions;
        let mut mask_data = Vec::with_capacity((orig_width as usize) * (orig_height as usize));

        for y in 0..orig_height {
            for x in 0..orig_width {
                let value = Self::tensor_value_at(tensor, x, y, &transformation);
                mask_data.push((value.clamp(0.0, 1.0) * 255.0) as u8);
            }
        }

        Ok(SegmentationMask::new(mask_data, original_dimensions))
    }

    /// Reproduce the preprocessing geometry to map original pixels onto the mask
    fn inverse_transformation(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
    ) -> CoordinateTransformation {
        let shape = tensor.shape();
        let mask_height = shape.get(2).copied().unwrap_or(0) as u32;
        let mask_width = shape.get(3).copied().unwrap_or(0) as u32;
        let (orig_width, orig_height) = original_dimensions;

        // Square model input assumed, same as preprocessing
        let target_size_f32 = mask_width as f32;
        let scale = (target_size_f32 / orig_width as f32).min(target_size_f32 / orig_height as f32);

        let scaled_width = (orig_width as f32 * scale).round() as u32;
        let scaled_height = (orig_height as f32 * scale).round() as u32;
        let offset_x = mask_width.saturating_sub(scaled_width) / 2;
        let offset_y = mask_height.saturating_sub(scaled_height) / 2;

        CoordinateTransformation {
            scale,
            offset_x,
            offset_y,
            mask_width,
            mask_height,
        }
    }

    /// Sample the tensor at the mask position of an original-image pixel
    fn tensor_value_at(
        tensor: &Array4<f32>,
        x: u32,
        y: u32,
        transformation: &CoordinateTransformation,
    ) -> f32 {
        let mask_x = (x as f32 * transformation.scale).round() as u32 + transformation.offset_x;
        let mask_y = (y as f32 * transformation.scale).round() as u32 + transformation.offset_y;

        if mask_x >= transformation.mask_width || mask_y >= transformation.mask_height {
            return 0.0;
        }

        tensor
            .get([0, 0, mask_y as usize, mask_x as usize])
            .copied()
            .unwrap_or(0.0)
    }
}

impl SegmentationBackend for OnnxBackend {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RemovalError::segmentation("input image has zero pixels"));
        }

        let input_tensor = self.preprocess(image)?;
        let output_tensor = self.infer(&input_tensor)?;
        let mask = Self::tensor_to_mask(&output_tensor, (width, height))?;
        Ok(mask.apply_to(image))
    }
}
