//! Log subscriber setup.
//!
//! The auth core itself only emits `tracing` events inside the span handed
//! to [`crate::AuthService`]; this module decides where they go.

use crate::config::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the root span
    pub service_name: String,
    /// Log level filter
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_env(Environment::Local)
    }
}

impl TracingConfig {
    /// Defaults for a deployment environment.
    #[must_use]
    pub fn for_env(env: Environment) -> Self {
        let (log_level, json_output) = match env {
            Environment::Local => ("debug", false),
            Environment::Dev => ("debug", true),
            Environment::Prod => ("info", true),
        };
        Self {
            service_name: "sso".to_string(),
            log_level: log_level.to_string(),
            json_output,
        }
    }

    /// Create config with custom service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Create config with custom log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Root span for a service instance. Pass it to
    /// [`crate::AuthService::with_log_span`].
    #[must_use]
    pub fn root_span(&self) -> tracing::Span {
        tracing::info_span!("service", name = %self.service_name)
    }
}

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Should be called
/// once at application startup.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    }
}
