//! Per-invocation resolution of configured secrets.

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, Instrument};

use super::cache::SecretCache;
use super::clock::{Clock, SystemClock};
use super::error::Result;
use super::provider::SecretProvider;
use super::value::SecretValue;

/// Secrets resolved for one invocation, keyed by context-key.
///
/// Keys whose fetch failed with nothing cached are absent. Serializes with
/// redacted values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSecrets {
    secrets: BTreeMap<String, SecretValue>,
}

impl ResolvedSecrets {
    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.secrets.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.secrets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.secrets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue)> {
        self.secrets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> BTreeMap<String, SecretValue> {
        self.secrets
    }

    /// Unredacted JSON rendering, for handing secrets to their consumer.
    pub fn to_exposed_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.secrets.iter().map(|(k, v)| (k.clone(), v.to_exposed_json())).collect(),
        )
    }
}

impl IntoIterator for ResolvedSecrets {
    type Item = (String, SecretValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, SecretValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.secrets.into_iter()
    }
}

/// Resolves a set of `context-key → remote-identifier` pairs through a shared
/// [`SecretCache`].
///
/// The resolver is cheap to clone; clones share the cache, provider and clock.
#[derive(Clone)]
pub struct SecretResolver {
    cache: Arc<SecretCache>,
    provider: Arc<dyn SecretProvider>,
    clock: Arc<dyn Clock>,
}

impl SecretResolver {
    /// Resolver using the system clock.
    pub fn new(cache: Arc<SecretCache>, provider: Arc<dyn SecretProvider>) -> Self {
        Self::with_clock(cache, provider, Arc::new(SystemClock))
    }

    pub fn with_clock(
        cache: Arc<SecretCache>,
        provider: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { cache, provider, clock }
    }

    pub fn cache(&self) -> &Arc<SecretCache> {
        &self.cache
    }

    /// Resolve every requested secret.
    ///
    /// Keys are looked up concurrently and all observe the same timestamp. An
    /// empty request returns immediately without touching the provider. Every
    /// lookup runs to completion, so each key records its attempt even when
    /// another key fails.
    ///
    /// # Errors
    ///
    /// With `throw_on_failed_call`, the first key (in key order) that failed with
    /// nothing cached. Values stored for other keys stay cached.
    pub async fn resolve(&self, requested: &BTreeMap<String, String>) -> Result<ResolvedSecrets> {
        if requested.is_empty() {
            debug!("No secrets requested, skipping resolution");
            return Ok(ResolvedSecrets::default());
        }

        let now = self.clock.now();
        let span = crate::resolve_span!(requested.len());

        async move {
            let lookups = requested.iter().map(|(key, identifier)| async move {
                (key, self.cache.get(key, identifier, self.provider.as_ref(), now).await)
            });

            let mut secrets = BTreeMap::new();
            for (key, outcome) in join_all(lookups).await {
                match outcome? {
                    Some(value) => {
                        secrets.insert(key.clone(), value);
                    }
                    None => debug!(key = %key, "Secret unavailable, leaving it unset"),
                }
            }

            debug!(resolved = secrets.len(), requested = requested.len(), "Resolved secrets");
            Ok::<_, super::SecretsError>(ResolvedSecrets { secrets })
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("provider_type", &self.provider.provider_type())
            .field("clock", &self.clock)
            .field("cache", &self.cache)
            .finish()
    }
}
