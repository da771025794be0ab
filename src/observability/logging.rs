//! # Structured Logging
//!
//! Subscriber setup for the binary and span macros used by the library. The
//! library itself only emits `tracing` events; installing a subscriber is left to
//! the host process.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::{Error, Result};

/// Create a tracing span covering one secret resolution.
///
/// ```rust,ignore
/// let span = resolve_span!(requested.len());
/// let span = resolve_span!(requested.len(), invocation = 3);
/// ```
#[macro_export]
macro_rules! resolve_span {
    ($requested:expr) => {
        tracing::debug_span!(
            "resolve_secrets",
            requested = $requested,
            resolution_id = %uuid::Uuid::new_v4()
        )
    };
    ($requested:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "resolve_secrets",
            requested = $requested,
            resolution_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for one invocation passing through the middleware.
#[macro_export]
macro_rules! invocation_span {
    ($invocation_id:expr) => {
        tracing::info_span!("invocation", invocation_id = %$invocation_id)
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Installing twice (for example
/// from several integration tests) is not an error.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::try_new(&config.level).map_err(|e| {
            Error::config_with_source(format!("Invalid log level '{}'", config.level), Box::new(e))
        })?,
    };

    let installed = if config.json {
        tracing::subscriber::set_global_default(
            fmt().json().with_env_filter(filter).with_current_span(true).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            fmt().with_env_filter(filter).with_target(false).finish(),
        )
    };

    if installed.is_err() {
        // Subscriber already set elsewhere; keep it.
        tracing::debug!("Global tracing subscriber already installed");
    }
    Ok(())
}

/// Log the effective secrets configuration at startup. Identifiers are logged,
/// values never are.
pub fn log_secrets_config(config: &crate::config::SecretsConfig) {
    tracing::info!(
        secrets = config.secrets.len(),
        cache = config.cache,
        cache_expiry_ms = ?config.cache_expiry_in_millis,
        throw_on_failed_call = config.throw_on_failed_call,
        "Secrets middleware configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = resolve_span!(2);
        let _span = resolve_span!(2, invocation = 1);
        let _span = invocation_span!("inv-1");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_log_secrets_config() {
        log_secrets_config(&crate::config::SecretsConfig::default());
    }
}
