//! Server command-line interface
//!
//! Flags override the environment-derived configuration; anything not given
//! on the command line falls back to `PORT`, `DEBUG`, `BGREMOVE_MODEL` and
//! `BGREMOVE_ALLOWED_ORIGINS`.

use crate::backends::create_backend;
use crate::config::{BackendKind, ExecutionProvider, ServiceConfig};
use crate::processor::BackgroundRemovalProcessor;
use crate::server;
use crate::tracing_config::{TracingConfig, TracingFormat};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Background removal HTTP service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-serve")]
pub struct Cli {
    /// Listening port [default: PORT env or 5000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable debug mode (more verbose logging) [default: DEBUG env]
    #[arg(long)]
    pub debug: bool,

    /// Path to an ONNX model file [default: BGREMOVE_MODEL env]
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Segmentation backend
    #[arg(short, long, value_enum, default_value_t = CliBackend::Auto)]
    pub backend: CliBackend,

    /// Execution provider for the ONNX backend
    #[arg(short, long, value_enum, default_value_t = CliExecutionProvider::Auto)]
    pub execution_provider: CliExecutionProvider,

    /// Number of inference threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    /// Allowed CORS origin (repeatable; replaces the default allow-list)
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    pub allowed_origins: Vec<String>,

    /// Maximum accepted request body size in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_image_size: Option<usize>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliBackend {
    Auto,
    Onnx,
    Mock,
}

impl From<CliBackend> for BackendKind {
    fn from(backend: CliBackend) -> Self {
        match backend {
            CliBackend::Auto => Self::Auto,
            CliBackend::Onnx => Self::Onnx,
            CliBackend::Mock => Self::Mock,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliExecutionProvider {
    Auto,
    Cpu,
    Cuda,
    Coreml,
}

impl From<CliExecutionProvider> for ExecutionProvider {
    fn from(provider: CliExecutionProvider) -> Self {
        match provider {
            CliExecutionProvider::Auto => Self::Auto,
            CliExecutionProvider::Cpu => Self::Cpu,
            CliExecutionProvider::Cuda => Self::Cuda,
            CliExecutionProvider::Coreml => Self::CoreMl,
        }
    }
}

impl Cli {
    /// Merge CLI flags over the environment-derived configuration
    fn into_config(self) -> ServiceConfig {
        let mut config = ServiceConfig::from_env();

        if let Some(port) = self.port {
            config.port = port;
        }
        if self.debug {
            config.debug = true;
        }
        if let Some(model) = self.model {
            config.model_path = Some(model);
        }
        if !self.allowed_origins.is_empty() {
            config.allowed_origins = self.allowed_origins;
        }
        if let Some(max_image_size) = self.max_image_size {
            config.max_image_size_bytes = max_image_size;
        }
        config.backend = self.backend.into();
        config.execution_provider = self.execution_provider.into();
        config.threads = self.threads;
        config
    }
}

/// Parse arguments, build the backend and run the server
///
/// # Errors
///
/// Returns an error for invalid configuration, backend initialization
/// failures, or server errors.
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let verbosity = cli.verbose;
    let config = cli.into_config();

    let verbosity = verbosity.max(u8::from(config.debug));
    TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(TracingFormat::Console)
        .init()
        .context("Failed to initialize tracing")?;

    config.validate().context("Invalid configuration")?;

    let backend = create_backend(&config).context("Failed to initialize segmentation backend")?;
    let processor = Arc::new(BackgroundRemovalProcessor::new(backend));
    info!(backend = processor.backend_name(), "Segmentation backend ready");

    server::serve(&config, processor).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "bgremove-serve",
            "--port",
            "8080",
            "--backend",
            "mock",
            "--allowed-origin",
            "http://localhost:9000",
            "--max-image-size",
            "1048576",
        ]);
        let config = cli.into_config();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.allowed_origins, vec!["http://localhost:9000"]);
        assert_eq!(config.max_image_size_bytes, 1_048_576);
    }

    #[test]
    fn test_execution_provider_mapping() {
        let cli = Cli::parse_from(["bgremove-serve", "-e", "coreml"]);
        let config = cli.into_config();
        assert_eq!(config.execution_provider, ExecutionProvider::CoreMl);
    }
}
