//! Tracing configuration
//!
//! The binary configures the subscriber; the library only emits trace
//! events.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable console output with colors
    Console,
    /// Plain compact output for CI and log collection
    Compact,
}

/// Tracing configuration builder
#[derive(Debug)]
pub struct TracingConfig {
    /// Verbosity level (0 = info, 1 = debug, 2+ = trace)
    pub verbosity: u8,
    /// Output format
    pub format: TracingFormat,
    /// Environment filter string (overrides verbosity if set)
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Create a new tracing configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set output format
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Set custom environment filter
    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Convert verbosity level to a filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error when the filter string is invalid or a subscriber is
    /// already installed.
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = if let Some(env_filter) = &self.env_filter {
            EnvFilter::try_new(env_filter)?
        } else {
            EnvFilter::try_new(self.verbosity_to_filter())?
        };

        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_level(true)
                    .compact();
                registry.with(fmt_layer).init();
            },
            TracingFormat::Compact => {
                let fmt_layer = fmt::layer().with_ansi(false).with_target(false).compact();
                registry.with(fmt_layer).init();
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter_mapping() {
        assert_eq!(TracingConfig::new().verbosity_to_filter(), "info");
        assert_eq!(
            TracingConfig::new().with_verbosity(1).verbosity_to_filter(),
            "debug"
        );
        assert_eq!(
            TracingConfig::new().with_verbosity(5).verbosity_to_filter(),
            "trace"
        );
    }

    #[test]
    fn test_env_filter_override() {
        let config = TracingConfig::new().with_env_filter("bgremove_service=trace");
        assert_eq!(
            config.env_filter.as_deref(),
            Some("bgremove_service=trace")
        );
    }
}
