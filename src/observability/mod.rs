//! # Observability Infrastructure
//!
//! Structured logging setup and cache metrics.

pub mod logging;
pub mod metrics;

pub use self::logging::{init_logging, log_secrets_config};
pub use self::metrics::SecretsMetrics;
