//! Process-wide secret cache with lazy refresh and stale fallback.
//!
//! One [`SecretCache`] is built when the host process starts and shared by handle
//! with every invocation. All reads and writes go through [`SecretCache::get`],
//! which applies a single rule set:
//!
//! - no entry (or caching disabled): fetch, store on success
//! - entry present and the refresh window since the last *attempt* has not
//!   elapsed: serve the entry without calling the provider
//! - window elapsed: fetch again; on failure keep serving the old value
//!
//! Because the window is measured from the last attempt rather than the last
//! success, a failing provider is called at most once per window per key.
//!
//! # Concurrency
//!
//! Each context-key owns an async mutex that is held across the whole
//! check/fetch/store sequence. Concurrent invocations asking for the same key
//! therefore wait for one fetch instead of issuing their own, while lookups for
//! unrelated keys never block each other.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::Result;
use super::provider::SecretProvider;
use super::value::SecretValue;
use crate::observability::metrics::SecretsMetrics;

/// Refresh and failure policy applied by a [`SecretCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// Serve entries without a provider call while their window is open.
    pub caching_enabled: bool,
    /// Refresh window. `None` keeps entries for the life of the process.
    pub expiry: Option<Duration>,
    /// Surface fetch errors when no value (fresh or stale) is available.
    pub throw_on_failed_call: bool,
}

impl CachePolicy {
    /// Every lookup goes to the provider.
    pub fn uncached() -> Self {
        Self::default()
    }

    /// Reuse entries, refreshing once `expiry` has elapsed since the last attempt.
    pub fn cached(expiry: Option<Duration>) -> Self {
        Self { caching_enabled: true, expiry, throw_on_failed_call: false }
    }

    pub fn with_throw_on_failed_call(mut self, throw_on_failed_call: bool) -> Self {
        self.throw_on_failed_call = throw_on_failed_call;
        self
    }

    /// Whether an entry last attempted at `last_attempt_at` may be served at `now`.
    fn window_open(&self, last_attempt_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if !self.caching_enabled {
            return false;
        }
        match self.expiry {
            None => true,
            Some(expiry) => {
                // A clock that stepped backwards counts as no time elapsed.
                let elapsed = (now - last_attempt_at).to_std().unwrap_or(Duration::ZERO);
                elapsed < expiry
            }
        }
    }
}

/// Cached state of one secret.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    value: SecretValue,
    fetched_at: DateTime<Utc>,
    last_attempt_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: SecretValue, now: DateTime<Utc>) -> Self {
        Self { value, fetched_at: now, last_attempt_at: now }
    }

    fn record_success(&mut self, value: SecretValue, now: DateTime<Utc>) {
        self.value = value;
        self.fetched_at = now;
        self.last_attempt_at = now;
    }

    fn record_failure(&mut self, now: DateTime<Utc>) {
        self.last_attempt_at = now;
    }

    /// Last successfully fetched value.
    pub fn value(&self) -> &SecretValue {
        &self.value
    }

    /// When `value` was fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// When the provider was last called for this key, successfully or not.
    pub fn last_attempt_at(&self) -> DateTime<Utc> {
        self.last_attempt_at
    }
}

/// Point-in-time counters for a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from an entry without calling the provider.
    pub hits: u64,
    /// Provider calls issued.
    pub fetches: u64,
    /// Provider calls that failed or returned an unusable payload.
    pub fetch_failures: u64,
    /// Failed fetches answered with the previous value.
    pub stale_served: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    stale_served: AtomicU64,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Process-wide cache of resolved secrets keyed by context-key.
pub struct SecretCache {
    slots: DashMap<String, Slot>,
    policy: CachePolicy,
    counters: Counters,
    metrics: SecretsMetrics,
}

impl SecretCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            slots: DashMap::new(),
            policy,
            counters: Counters::default(),
            metrics: SecretsMetrics::new(),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Resolve `key` through the cache, calling `provider` for `identifier` when
    /// the refresh rules require it.
    ///
    /// Returns `Ok(None)` when the fetch failed, nothing was cached and the policy
    /// swallows failures.
    ///
    /// # Errors
    ///
    /// The provider or parse error, only when `throw_on_failed_call` is set and no
    /// previous value exists for `key`.
    pub async fn get<P>(
        &self,
        key: &str,
        identifier: &str,
        provider: &P,
        now: DateTime<Utc>,
    ) -> Result<Option<SecretValue>>
    where
        P: SecretProvider + ?Sized,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(existing) = entry.as_ref() {
            if self.policy.window_open(existing.last_attempt_at, now) {
                debug!(key = %key, "Cache hit for secret");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_cache_hit(key);
                return Ok(Some(existing.value.clone()));
            }
            debug!(key = %key, "Cached secret due for refresh");
        } else {
            debug!(key = %key, "Cache miss, fetching secret");
        }

        // The attempt counts even if this future is dropped mid-fetch.
        if let Some(existing) = entry.as_mut() {
            existing.last_attempt_at = now;
        }

        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let fetched = match provider.fetch(identifier).await {
            Ok(payload) => SecretValue::parse(identifier, payload),
            Err(e) => Err(e),
        };
        self.metrics.record_fetch(key, fetched.is_ok());

        match fetched {
            Ok(value) => {
                debug!(
                    key = %key,
                    provider = provider.provider_type(),
                    shape = value.shape(),
                    "Fetched secret"
                );
                match entry.as_mut() {
                    Some(existing) => existing.record_success(value.clone(), now),
                    None => *entry = Some(CacheEntry::new(value.clone(), now)),
                }
                Ok(Some(value))
            }
            Err(error) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                match entry.as_mut() {
                    Some(existing) => {
                        existing.record_failure(now);
                        warn!(
                            key = %key,
                            error = %error,
                            fetched_at = %existing.fetched_at,
                            "Secret refresh failed, serving stale value"
                        );
                        self.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                        self.metrics.record_stale_served(key);
                        Ok(Some(existing.value.clone()))
                    }
                    None if self.policy.throw_on_failed_call => {
                        warn!(key = %key, error = %error, "Secret fetch failed with nothing cached");
                        Err(error)
                    }
                    None => {
                        warn!(
                            key = %key,
                            error = %error,
                            "Secret fetch failed with nothing cached, leaving it unset"
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Copy of the entry for `key`, if one was ever fetched successfully.
    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        let slot = self.slots.get(key).map(|slot| Arc::clone(slot.value()))?;
        let entry = slot.lock().await;
        entry.clone()
    }

    /// Number of keys holding a value.
    pub async fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.iter().map(|slot| Arc::clone(slot.value())).collect();
        let mut populated = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                populated += 1;
            }
        }
        populated
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
            stale_served: self.counters.stale_served.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.to_string()).or_default().value())
    }
}

impl Default for SecretCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretCache")
            .field("policy", &self.policy)
            .field("keys", &self.slots.len())
            .field("stats", &self.stats())
            .finish()
    }
}
