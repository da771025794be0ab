//! Integration tests for multi-key resolution and failure propagation.

use secrets_cache::secrets::testing::{ScriptedProvider, ScriptedResponse};
use secrets_cache::{
    CachePolicy, Clock, ManualClock, SecretCache, SecretPayload, SecretResolver, SecretValue,
    SecretsError,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_test::traced_test;

fn requested(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn resolver(
    policy: CachePolicy,
    provider: Arc<ScriptedProvider>,
    clock: &ManualClock,
) -> SecretResolver {
    SecretResolver::with_clock(
        Arc::new(SecretCache::new(policy)),
        provider,
        Arc::new(clock.clone()),
    )
}

#[tokio::test]
async fn test_swallowed_failure_omits_key() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.respond_failure("rds_login", "AccessDenied");
    let resolver = resolver(CachePolicy::uncached(), provider.clone(), &ManualClock::default());

    let resolved = resolver.resolve(&requested(&[("KEY_NAME", "rds_login")])).await.unwrap();
    assert!(resolved.is_empty());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_strict_failure_returns_error() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.respond_failure("rds_login", "AccessDenied");
    let policy = CachePolicy::uncached().with_throw_on_failed_call(true);
    let resolver = resolver(policy, provider, &ManualClock::default());

    let err = resolver.resolve(&requested(&[("KEY_NAME", "rds_login")])).await.unwrap_err();
    assert!(matches!(err, SecretsError::Provider { .. }));
    assert_eq!(err.identifier(), "rds_login");
    assert!(err.to_string().contains("AccessDenied"));
}

#[tokio::test]
async fn test_strict_mode_with_cached_value_serves_stale() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_json(json!({ "Username": "u" }));
    provider.push_failure("AccessDenied");
    let policy = CachePolicy::uncached().with_throw_on_failed_call(true);
    let resolver = resolver(policy, provider.clone(), &ManualClock::default());
    let requested = requested(&[("KEY_NAME", "rds_login")]);

    resolver.resolve(&requested).await.unwrap();
    let resolved = resolver.resolve(&requested).await.unwrap();

    assert_eq!(resolved.get("KEY_NAME").and_then(|v| v.field("Username")), Some("u"));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_strict_abort_keeps_resolved_keys_cached() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.respond_failure("bad", "AccessDenied");
    provider.respond_json("good", json!({ "Username": "u" }));
    let policy = CachePolicy::cached(None).with_throw_on_failed_call(true);
    let resolver = resolver(policy, provider.clone(), &ManualClock::default());
    let requested = requested(&[("A_BAD", "bad"), ("B_GOOD", "good")]);

    let err = resolver.resolve(&requested).await.unwrap_err();
    assert_eq!(err.identifier(), "bad");

    let entry = resolver.cache().entry("B_GOOD").await.unwrap();
    assert_eq!(entry.value().field("Username"), Some("u"));

    // The good key is served from the cache on the next attempt
    assert!(resolver.resolve(&requested).await.is_err());
    assert_eq!(provider.calls_for("good"), 1);
    assert_eq!(provider.calls_for("bad"), 2);
}

#[tokio::test]
async fn test_strict_abort_does_not_refetch_sibling_within_window() {
    let provider = Arc::new(ScriptedProvider::new().with_latency(Duration::from_millis(20)));
    provider.respond_failure("bad", "AccessDenied");
    provider.respond_json("good", json!({ "Username": "u" }));
    let clock = ManualClock::default();
    let policy =
        CachePolicy::cached(Some(Duration::from_millis(50))).with_throw_on_failed_call(true);
    let resolver = resolver(policy, provider.clone(), &clock);

    resolver.resolve(&requested(&[("B_GOOD", "good")])).await.unwrap();

    clock.advance(Duration::from_millis(60));
    let both = requested(&[("A_BAD", "bad"), ("B_GOOD", "good")]);
    assert!(resolver.resolve(&both).await.is_err());
    assert!(resolver.resolve(&both).await.is_err());

    assert_eq!(provider.calls_for("good"), 2);
    let entry = resolver.cache().entry("B_GOOD").await.unwrap();
    assert_eq!(entry.fetched_at(), clock.now());
    assert_eq!(entry.last_attempt_at(), clock.now());
}

#[tokio::test]
async fn test_empty_request_is_noop() {
    let provider = Arc::new(ScriptedProvider::new());
    let policy = CachePolicy::uncached().with_throw_on_failed_call(true);
    let resolver = resolver(policy, provider.clone(), &ManualClock::default());

    let resolved = resolver.resolve(&BTreeMap::new()).await.unwrap();
    assert!(resolved.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_keys_are_independent() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.respond_json("db", json!({ "Username": "u" }));
    provider.respond_json("api", json!({ "key": "k-1" }));
    let clock = ManualClock::default();
    let resolver = resolver(
        CachePolicy::cached(Some(Duration::from_millis(100))),
        provider.clone(),
        &clock,
    );

    resolver.resolve(&requested(&[("DB", "db")])).await.unwrap();

    clock.advance(Duration::from_millis(60));
    let resolved = resolver.resolve(&requested(&[("DB", "db"), ("API", "api")])).await.unwrap();
    assert_eq!(resolved.len(), 2);
    assert_eq!(provider.calls_for("db"), 1);
    assert_eq!(provider.calls_for("api"), 1);

    // db's window closes at 100, api's at 160
    clock.advance(Duration::from_millis(50));
    resolver.resolve(&requested(&[("DB", "db"), ("API", "api")])).await.unwrap();
    assert_eq!(provider.calls_for("db"), 2);
    assert_eq!(provider.calls_for("api"), 1);
}

#[tokio::test]
async fn test_one_key_failing_leaves_others_resolved() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.respond_json("db", json!({ "Username": "u" }));
    provider.respond_failure("api", "timeout");
    let resolver = resolver(CachePolicy::uncached(), provider, &ManualClock::default());

    let resolved =
        resolver.resolve(&requested(&[("DB", "db"), ("API", "api")])).await.unwrap();
    assert!(resolved.contains_key("DB"));
    assert!(!resolved.contains_key("API"));
}

#[tokio::test]
async fn test_concurrent_resolutions_share_one_fetch() {
    let provider = Arc::new(ScriptedProvider::new().with_latency(Duration::from_millis(20)));
    provider.set_default(ScriptedResponse::Payload(SecretPayload::text("k-1")));
    let resolver = resolver(CachePolicy::cached(None), provider.clone(), &ManualClock::default());
    let requested = requested(&[("API", "api")]);

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let resolver = resolver.clone();
            let requested = requested.clone();
            tokio::spawn(async move { resolver.resolve(&requested).await })
        })
        .collect();

    for handle in handles {
        let resolved = handle.await.unwrap().unwrap();
        assert_eq!(resolved.get("API").and_then(SecretValue::as_scalar), Some("k-1"));
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_stale_fallback_is_logged_without_value() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_json(json!({ "Password": "hunter2" }));
    provider.push_failure("throttled");
    let resolver = resolver(CachePolicy::uncached(), provider, &ManualClock::default());
    let requested = requested(&[("DB", "rds_login")]);

    resolver.resolve(&requested).await.unwrap();
    resolver.resolve(&requested).await.unwrap();

    assert!(logs_contain("serving stale value"));
    assert!(!logs_contain("hunter2"));
}
