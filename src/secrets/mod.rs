//! Secret caching and resolution.
//!
//! The host process builds one [`SecretCache`] at startup and shares it with a
//! [`SecretResolver`] for every invocation. The resolver asks the cache for each
//! configured `context-key → remote-identifier` pair; the cache decides whether
//! to serve what it has or call the injected [`SecretProvider`].
//!
//! # Refresh and failure policy
//!
//! - **Lazy refresh**: nothing happens in the background. An expired entry is
//!   refreshed by the next invocation that asks for it.
//! - **Once per window**: the expiry window is measured from the last fetch
//!   *attempt*, so a provider outage costs at most one call per key per window.
//! - **Stale fallback**: a failed refresh keeps serving the previous value.
//! - **Strict mode**: with `throw_on_failed_call`, a failure surfaces only when
//!   there is nothing cached for that key.
//!
//! # Example
//!
//! ```rust,ignore
//! use secrets_cache::secrets::{CachePolicy, EnvSecretProvider, SecretCache, SecretResolver};
//! use std::{collections::BTreeMap, sync::Arc, time::Duration};
//!
//! let cache = Arc::new(SecretCache::new(CachePolicy::cached(Some(Duration::from_secs(300)))));
//! let resolver = SecretResolver::new(cache, Arc::new(EnvSecretProvider::new()));
//!
//! let requested = BTreeMap::from([("DB_LOGIN".to_string(), "rds_login".to_string())]);
//! let secrets = resolver.resolve(&requested).await?;
//! let password = secrets.get("DB_LOGIN").and_then(|v| v.field("Password"));
//! ```

pub mod cache;
pub mod clock;
pub mod env;
pub mod error;
pub mod provider;
pub mod resolver;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod types;
pub mod value;

pub use cache::{CacheEntry, CachePolicy, CacheStats, SecretCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use env::EnvSecretProvider;
pub use error::{Result, SecretsError};
pub use provider::{SecretPayload, SecretProvider};
pub use resolver::{ResolvedSecrets, SecretResolver};
pub use types::SecretString;
pub use value::SecretValue;
