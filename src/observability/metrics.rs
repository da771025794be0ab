//! # Metrics Collection
//!
//! Cache counters reported through the `metrics` facade. No exporter is
//! installed here; without a recorder the calls are no-ops.

use metrics::{counter, describe_counter, Unit};
use std::sync::Once;

pub const CACHE_HITS_TOTAL: &str = "secrets_cache_hits_total";
pub const FETCHES_TOTAL: &str = "secrets_cache_fetches_total";
pub const STALE_SERVED_TOTAL: &str = "secrets_cache_stale_served_total";

static DESCRIBE: Once = Once::new();

/// Records cache activity, labelled by context-key.
#[derive(Debug, Clone, Default)]
pub struct SecretsMetrics;

impl SecretsMetrics {
    /// Create a new recorder handle
    pub fn new() -> Self {
        DESCRIBE.call_once(describe_metrics);
        Self
    }

    /// Record a lookup answered from the cache
    pub fn record_cache_hit(&self, key: &str) {
        let labels = [("key", key.to_string())];
        counter!(CACHE_HITS_TOTAL, &labels).increment(1);
    }

    /// Record a provider call and whether it produced a usable value
    pub fn record_fetch(&self, key: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("key", key.to_string()), ("status", status.to_string())];
        counter!(FETCHES_TOTAL, &labels).increment(1);
    }

    /// Record a failed refresh answered with the previous value
    pub fn record_stale_served(&self, key: &str) {
        let labels = [("key", key.to_string())];
        counter!(STALE_SERVED_TOTAL, &labels).increment(1);
    }
}

fn describe_metrics() {
    describe_counter!(CACHE_HITS_TOTAL, Unit::Count, "Secret lookups served from the cache");
    describe_counter!(FETCHES_TOTAL, Unit::Count, "Secret provider calls by outcome");
    describe_counter!(
        STALE_SERVED_TOTAL,
        Unit::Count,
        "Failed secret refreshes answered with the previous value"
    );
}
