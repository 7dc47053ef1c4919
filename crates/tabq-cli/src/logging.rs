//! Logging configuration for the tabq CLI.
//!
//! Built on the `tracing` framework. Diagnostics go to stderr so the
//! result stream keeps stdout to itself; `RUST_LOG` overrides the
//! configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level filter
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LogConfig {
    /// Create a config with the given level filter.
    pub fn new<S: Into<String>>(level: S) -> Self {
        Self {
            level: level.into(),
        }
    }

    /// Initialize global logging with this configuration.
    pub fn init(self) {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .expect("Invalid log level");

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}
