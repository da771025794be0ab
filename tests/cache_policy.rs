//! Integration tests for the refresh window and stale fallback rules.
//!
//! Every test drives a manual clock so that the timeline is exact.

use chrono::{DateTime, Utc};
use secrets_cache::secrets::testing::ScriptedProvider;
use secrets_cache::{
    CachePolicy, Clock, ManualClock, SecretCache, SecretPayload, SecretResolver, SecretValue,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    provider: Arc<ScriptedProvider>,
    clock: ManualClock,
    cache: Arc<SecretCache>,
    resolver: SecretResolver,
    requested: BTreeMap<String, String>,
}

impl Harness {
    fn new(policy: CachePolicy) -> Self {
        let provider = Arc::new(ScriptedProvider::new());
        let clock = ManualClock::default();
        let cache = Arc::new(SecretCache::new(policy));
        let resolver =
            SecretResolver::with_clock(cache.clone(), provider.clone(), Arc::new(clock.clone()));
        let requested = BTreeMap::from([("KEY_NAME".to_string(), "rds_login".to_string())]);
        Self { provider, clock, cache, resolver, requested }
    }

    fn at(&self, millis: u64) {
        let offset = chrono::Duration::milliseconds(millis as i64);
        self.clock.set(DateTime::<Utc>::UNIX_EPOCH + offset);
    }

    async fn username(&self) -> Option<String> {
        let resolved = self.resolver.resolve(&self.requested).await.unwrap();
        resolved.get("KEY_NAME").and_then(|v| v.field("Username")).map(str::to_string)
    }
}

fn expiring(millis: u64) -> CachePolicy {
    CachePolicy::cached(Some(Duration::from_millis(millis)))
}

#[tokio::test]
async fn test_seed_scenario() {
    let harness = Harness::new(expiring(10));
    harness.provider.push_json(json!({ "Username": "u", "Password": "p" }));

    let resolved = harness.resolver.resolve(&harness.requested).await.unwrap();
    assert_eq!(
        resolved.get("KEY_NAME"),
        Some(&SecretValue::structured([("Username", "u"), ("Password", "p")]))
    );
    assert_eq!(harness.provider.call_count(), 1);

    harness.at(20);
    harness.provider.push_failure("throttled");
    assert_eq!(harness.username().await.as_deref(), Some("u"));
    assert_eq!(harness.provider.call_count(), 2);
}

#[tokio::test]
async fn test_first_resolution_populates_entry() {
    let harness = Harness::new(expiring(50));
    harness.provider.push_json(json!({ "Username": "u" }));

    assert_eq!(harness.username().await.as_deref(), Some("u"));

    let entry = harness.cache.entry("KEY_NAME").await.unwrap();
    assert_eq!(entry.fetched_at(), harness.clock.now());
    assert_eq!(entry.last_attempt_at(), entry.fetched_at());
}

#[tokio::test]
async fn test_no_refetch_within_window() {
    let harness = Harness::new(expiring(50));
    harness.provider.set_default_json(json!({ "Username": "u" }));

    for millis in [0, 10, 25, 49] {
        harness.at(millis);
        assert_eq!(harness.username().await.as_deref(), Some("u"));
    }
    assert_eq!(harness.provider.call_count(), 1);
    assert_eq!(harness.cache.stats().hits, 3);
}

#[tokio::test]
async fn test_refetch_after_expiry_issues_one_call() {
    let harness = Harness::new(expiring(50));
    harness.provider.push_json(json!({ "Username": "old" }));
    harness.provider.push_json(json!({ "Username": "new" }));

    assert_eq!(harness.username().await.as_deref(), Some("old"));

    harness.at(50);
    assert_eq!(harness.username().await.as_deref(), Some("new"));
    assert_eq!(harness.username().await.as_deref(), Some("new"));
    assert_eq!(harness.provider.call_count(), 2);
}

#[tokio::test]
async fn test_stale_value_served_and_attempt_recorded() {
    let harness = Harness::new(expiring(50));
    harness.provider.push_json(json!({ "Username": "u" }));
    harness.username().await;

    harness.at(60);
    harness.provider.push_failure("unavailable");
    assert_eq!(harness.username().await.as_deref(), Some("u"));

    let entry = harness.cache.entry("KEY_NAME").await.unwrap();
    assert_eq!(harness.clock.millis_since(entry.fetched_at()), 60);
    assert_eq!(harness.clock.millis_since(entry.last_attempt_at()), 0);
    assert_eq!(harness.cache.stats().stale_served, 1);
}

#[tokio::test]
async fn test_failing_provider_called_once_per_window() {
    let harness = Harness::new(expiring(50));
    harness.provider.push_json(json!({ "Username": "first" }));
    harness.provider.push_failure("unavailable");
    harness.provider.push_json(json!({ "Username": "second" }));

    // t=0 fetch
    assert_eq!(harness.username().await.as_deref(), Some("first"));
    assert_eq!(harness.provider.call_count(), 1);

    // t=40 inside the window
    harness.at(40);
    assert_eq!(harness.username().await.as_deref(), Some("first"));
    assert_eq!(harness.provider.call_count(), 1);

    // t=80 refresh attempt fails, stale value served
    harness.at(80);
    assert_eq!(harness.username().await.as_deref(), Some("first"));
    assert_eq!(harness.provider.call_count(), 2);

    // t=120 within 50ms of the failed attempt, no call
    harness.at(120);
    assert_eq!(harness.username().await.as_deref(), Some("first"));
    assert_eq!(harness.provider.call_count(), 2);

    // t=160 next attempt succeeds
    harness.at(160);
    assert_eq!(harness.username().await.as_deref(), Some("second"));
    assert_eq!(harness.provider.call_count(), 3);
}

#[tokio::test]
async fn test_unset_expiry_never_refreshes() {
    let harness = Harness::new(CachePolicy::cached(None));
    harness.provider.set_default_json(json!({ "Username": "u" }));

    harness.username().await;
    harness.at(86_400_000);
    harness.username().await;

    assert_eq!(harness.provider.call_count(), 1);
}

#[tokio::test]
async fn test_uncached_policy_fetches_every_time() {
    let harness = Harness::new(CachePolicy::uncached());
    harness.provider.push_json(json!({ "Username": "a" }));
    harness.provider.push_json(json!({ "Username": "b" }));

    assert_eq!(harness.username().await.as_deref(), Some("a"));
    assert_eq!(harness.username().await.as_deref(), Some("b"));
    assert_eq!(harness.provider.call_count(), 2);
}

#[tokio::test]
async fn test_parse_failure_treated_as_provider_failure() {
    let harness = Harness::new(expiring(10));
    harness.provider.push_json(json!({ "Username": "u" }));
    harness.provider.push_payload(SecretPayload::binary(vec![0xff, 0xfe]));

    harness.username().await;
    harness.at(10);
    assert_eq!(harness.username().await.as_deref(), Some("u"));
    assert_eq!(harness.cache.stats().fetch_failures, 1);
}
