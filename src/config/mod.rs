//! # Configuration Management
//!
//! Secrets middleware options live in [`settings`]; logging options for the
//! binary are read straight from the environment here.

pub mod settings;

pub use settings::SecretsConfig;

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let level = std::env::var("SECRETS_CACHE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json = std::env::var("SECRETS_CACHE_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self { level, json }
    }

    /// Raise the default level to `debug`
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = "debug".to_string();
        }
        self
    }
}
