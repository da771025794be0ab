//! # Secrets Middleware
//!
//! Adapter that resolves the configured secrets before each invocation and
//! places them on the invocation's context.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::SecretsConfig;
use crate::errors::Result;
use crate::secrets::{self, Clock, SecretCache, SecretProvider, SecretResolver, SecretValue};

/// Values visible to one invocation, keyed by context-key.
///
/// Serializes with redacted values; use [`InvocationContext::to_exposed_json`]
/// to hand the plain values to their consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InvocationContext {
    values: BTreeMap<String, SecretValue>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.values.get(key)
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: SecretValue) -> Option<SecretValue> {
        self.values.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_exposed_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values.iter().map(|(k, v)| (k.clone(), v.to_exposed_json())).collect(),
        )
    }
}

/// Resolves `config.secrets` through one shared cache on every invocation.
#[derive(Debug, Clone)]
pub struct SecretsMiddleware {
    requested: BTreeMap<String, String>,
    resolver: SecretResolver,
}

impl SecretsMiddleware {
    /// Validate `config` and build the cache it describes.
    pub fn new(
        config: &SecretsConfig,
        provider: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(SecretCache::new(config.policy()));
        Ok(Self {
            requested: config.secrets.clone(),
            resolver: SecretResolver::with_clock(cache, provider, clock),
        })
    }

    pub fn resolver(&self) -> &SecretResolver {
        &self.resolver
    }

    /// Context-keys resolved on each invocation.
    pub fn requested(&self) -> &BTreeMap<String, String> {
        &self.requested
    }

    /// Resolve the configured secrets and write them onto `ctx`, replacing any
    /// existing values under the same keys. Keys that could not be resolved are
    /// left untouched.
    pub async fn before(&self, ctx: &mut InvocationContext) -> secrets::Result<()> {
        let resolved = self.resolver.resolve(&self.requested).await?;

        debug!(resolved = resolved.len(), "Applying secrets to invocation context");
        for (key, value) in resolved {
            ctx.insert(key, value);
        }
        Ok(())
    }
}
