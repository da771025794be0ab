//! # secrets-cache
//!
//! Process-scoped caching of remote secrets for invocation pipelines. Each
//! invocation resolves a configured set of `context-key → identifier` pairs;
//! values are reused until their refresh window elapses, refreshed lazily by the
//! next invocation after that, and the last good value is served while the
//! provider is failing.
//!
//! ## Architecture
//!
//! ```text
//! SecretsMiddleware → SecretResolver → SecretCache → SecretProvider
//!                          ↓               ↓
//!                        Clock       per-key entries
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use secrets_cache::{
//!     EnvSecretProvider, InvocationContext, SecretsConfig, SecretsMiddleware, SystemClock,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SecretsConfig::from_file("secrets.toml")?;
//!     let middleware = SecretsMiddleware::new(
//!         &config,
//!         Arc::new(EnvSecretProvider::new()),
//!         Arc::new(SystemClock),
//!     )?;
//!
//!     let mut ctx = InvocationContext::new();
//!     middleware.before(&mut ctx).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{LoggingConfig, SecretsConfig};
pub use errors::{Error, Result};
pub use middleware::{InvocationContext, SecretsMiddleware};
pub use observability::init_logging;
pub use secrets::{
    CachePolicy, Clock, EnvSecretProvider, ManualClock, ResolvedSecrets, SecretCache,
    SecretPayload, SecretProvider, SecretResolver, SecretValue, SecretsError, SystemClock,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
