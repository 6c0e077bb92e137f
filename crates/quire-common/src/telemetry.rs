//! Tracing setup for quire binaries.
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! `RUST_LOG` overrides the default level (DEBUG in debug builds, INFO
//! otherwise).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name logged once tracing is up (e.g. "quire-cli").
    pub service_name: String,
    /// Console log level when `RUST_LOG` is unset.
    pub console_level: Level,
}

impl TelemetryConfig {
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };
        Self {
            service_name: service_name.into(),
            console_level,
        }
    }

    /// Raise or lower the default level, e.g. from a `-v` flag.
    pub fn with_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing(config: TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    match tracing_subscriber::registry().with(console_layer).try_init() {
        Ok(()) => tracing::debug!(
            target: "quire::telemetry",
            service = %config.service_name,
            "tracing initialized"
        ),
        Err(e) => tracing::debug!(
            target: "quire::telemetry",
            error = %e,
            "tracing already initialized"
        ),
    }
}
