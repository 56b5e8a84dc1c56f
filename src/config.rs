//! Service configuration
//!
//! All runtime configuration lives in an explicit [`ServiceConfig`] that is
//! constructed once at startup (from the environment, optionally overridden
//! by CLI flags) and handed to the server, rather than read from ambient
//! globals inside handlers.

use crate::error::{RemovalError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default listening port when `PORT` is not set
pub const DEFAULT_PORT: u16 = 5000;

/// Default upper bound on accepted request bodies (25 MiB)
pub const DEFAULT_MAX_IMAGE_SIZE_BYTES: usize = 25 * 1024 * 1024;

/// Browser origins allowed to call the service when no override is configured
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:3002",
    "https://school.unicard-serverless.com",
    "https://admin.unicard-serverless.com",
];

/// Segmentation backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Pick ONNX when a model is configured, mock otherwise
    Auto,
    /// ONNX Runtime backend (requires a model file)
    Onnx,
    /// Deterministic heuristic backend (no model file needed)
    Mock,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Auto
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Onnx => write!(f, "onnx"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Execution provider options for the ONNX Runtime backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionProvider {
    /// Auto-detect best available provider (CUDA > `CoreML` > CPU)
    Auto,
    /// CPU execution (always available)
    Cpu,
    /// NVIDIA CUDA GPU acceleration
    Cuda,
    /// Apple Silicon GPU acceleration
    CoreMl,
}

impl Default for ExecutionProvider {
    fn default() -> Self {
        Self::Auto
    }
}

impl std::fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
            Self::CoreMl => write!(f, "coreml"),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listening port
    pub port: u16,
    /// Debug mode (more verbose logging)
    pub debug: bool,
    /// Origins allowed by the CORS layer
    pub allowed_origins: Vec<String>,
    /// Upper bound on accepted request bodies in bytes
    pub max_image_size_bytes: usize,
    /// Which segmentation backend to run
    pub backend: BackendKind,
    /// Path to an ONNX model file (required by the ONNX backend)
    pub model_path: Option<PathBuf>,
    /// Execution provider for the ONNX backend
    pub execution_provider: ExecutionProvider,
    /// Number of inference threads (0 = auto-detect)
    pub threads: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            debug: false,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            max_image_size_bytes: DEFAULT_MAX_IMAGE_SIZE_BYTES,
            backend: BackendKind::Auto,
            model_path: None,
            execution_provider: ExecutionProvider::Auto,
            threads: 0,
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Build a configuration from the process environment
    ///
    /// Reads `PORT`, `DEBUG`, `BGREMOVE_MODEL` and `BGREMOVE_ALLOWED_ORIGINS`
    /// (comma separated). Unset or unparseable values fall back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => {
                    tracing::warn!(value = %port, "Ignoring unparseable PORT value");
                },
            }
        }

        if let Ok(debug) = std::env::var("DEBUG") {
            config.debug = debug.eq_ignore_ascii_case("true");
        }

        if let Ok(model) = std::env::var("BGREMOVE_MODEL") {
            if !model.is_empty() {
                config.model_path = Some(PathBuf::from(model));
            }
        }

        if let Ok(origins) = std::env::var("BGREMOVE_ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(ToString::to_string)
                .collect();
            if !origins.is_empty() {
                config.allowed_origins = origins;
            }
        }

        config
    }

    /// Resolve `Auto` backend selection against the configured model path
    #[must_use]
    pub fn resolved_backend(&self) -> BackendKind {
        match self.backend {
            BackendKind::Auto => {
                if self.model_path.is_some() {
                    BackendKind::Onnx
                } else {
                    BackendKind::Mock
                }
            },
            other => other,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidConfig` for inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_image_size_bytes == 0 {
            return Err(RemovalError::invalid_config(
                "max_image_size_bytes must be greater than zero",
            ));
        }
        if self.backend == BackendKind::Onnx && self.model_path.is_none() {
            return Err(RemovalError::invalid_config(
                "ONNX backend selected but no model path configured (set BGREMOVE_MODEL or --model)",
            ));
        }
        if self.allowed_origins.iter().any(String::is_empty) {
            return Err(RemovalError::invalid_config(
                "allowed origins must not contain empty entries",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    #[must_use]
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.config.allowed_origins = origins;
        self
    }

    #[must_use]
    pub fn max_image_size_bytes(mut self, bytes: usize) -> Self {
        self.config.max_image_size_bytes = bytes;
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    #[must_use]
    pub fn model_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.model_path = path;
        self
    }

    #[must_use]
    pub fn execution_provider(mut self, provider: ExecutionProvider) -> Self {
        self.config.execution_provider = provider;
        self
    }

    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidConfig` for inconsistent settings.
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 5000);
        assert!(!config.debug);
        assert_eq!(config.allowed_origins.len(), 4);
        assert_eq!(config.max_image_size_bytes, 25 * 1024 * 1024);
        assert_eq!(config.backend, BackendKind::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ServiceConfig::builder()
            .port(8080)
            .debug(true)
            .backend(BackendKind::Mock)
            .max_image_size_bytes(1024)
            .build()
            .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.debug);
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.max_image_size_bytes, 1024);
    }

    #[test]
    fn test_onnx_requires_model_path() {
        let result = ServiceConfig::builder().backend(BackendKind::Onnx).build();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("model path"));

        let result = ServiceConfig::builder()
            .backend(BackendKind::Onnx)
            .model_path(Some(PathBuf::from("/models/isnet.onnx")))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let result = ServiceConfig::builder().max_image_size_bytes(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_backend_resolution() {
        let config = ServiceConfig::default();
        assert_eq!(config.resolved_backend(), BackendKind::Mock);

        let config = ServiceConfig::builder()
            .model_path(Some(PathBuf::from("/models/isnet.onnx")))
            .build()
            .unwrap();
        assert_eq!(config.resolved_backend(), BackendKind::Onnx);

        let config = ServiceConfig::builder()
            .backend(BackendKind::Mock)
            .model_path(Some(PathBuf::from("/models/isnet.onnx")))
            .build()
            .unwrap();
        assert_eq!(config.resolved_backend(), BackendKind::Mock);
    }

    #[test]
    fn test_display() {
        assert_eq!(BackendKind::Onnx.to_string(), "onnx");
        assert_eq!(ExecutionProvider::CoreMl.to_string(), "coreml");
    }
}
