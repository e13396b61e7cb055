//! Contract tests for the bounded cache: TTL hit/miss behavior, the
//! no-write-on-failure rule, and explicit eviction.

use opsboard::cache::BoundedCache;
use opsboard::error::OpsboardError;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn second_call_within_ttl_does_not_fetch() {
    let cache = BoundedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let calls = calls.clone();
        let value = cache
            .get_or_fetch("incidents:active", Duration::from_secs(30), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["INC-1".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(value, vec!["INC-1".to_string()]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn call_after_ttl_expiry_fetches_again() {
    let cache = BoundedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let ttl = Duration::from_millis(40);

    for _ in 0..2 {
        let calls = calls.clone();
        cache
            .get_or_fetch("incidents:active", ttl, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1u32)
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_fetch_writes_no_entry_and_next_call_retries() {
    let cache = BoundedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let ttl = Duration::from_secs(60);

    let attempt = {
        let calls = calls.clone();
        cache
            .get_or_fetch::<u32, _, _>("incidents:active", ttl, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(OpsboardError::UpstreamTransient {
                    status: 500,
                    message: "boom".to_string(),
                })
            })
            .await
    };
    assert!(attempt.is_err());
    assert!(cache.is_empty().await, "failed fetch must not poison the cache");

    // The next call re-invokes the fetcher and succeeds.
    let calls_again = calls.clone();
    let value = cache
        .get_or_fetch("incidents:active", ttl, || async move {
            calls_again.fetch_add(1, Ordering::SeqCst);
            Ok(7u32)
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn invalidate_forces_refetch() {
    let cache = BoundedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let ttl = Duration::from_secs(60);

    for _ in 0..2 {
        let calls = calls.clone();
        cache
            .get_or_fetch("services:all", ttl, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("catalog".to_string())
            })
            .await
            .unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(cache.invalidate("services:all").await);
    let calls_after = calls.clone();
    cache
        .get_or_fetch("services:all", ttl, || async move {
            calls_after.fetch_add(1, Ordering::SeqCst);
            Ok("catalog".to_string())
        })
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalidate_pattern_scopes_eviction() {
    let cache = BoundedCache::new();
    let ttl = Duration::from_secs(60);
    for key in ["incidents:24h", "incidents:active", "services:all"] {
        cache
            .get_or_fetch(key, ttl, || async { Ok(0u8) })
            .await
            .unwrap();
    }

    let removed = cache
        .invalidate_pattern(&Regex::new("^incidents:").unwrap())
        .await;
    assert_eq!(removed, 2);
    assert_eq!(cache.len().await, 1);

    cache.clear().await;
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn sweeper_removes_expired_entries_in_background() {
    let cache = BoundedCache::new();
    cache
        .get_or_fetch("short", Duration::from_millis(20), || async { Ok(1u8) })
        .await
        .unwrap();
    cache
        .get_or_fetch("long", Duration::from_secs(300), || async { Ok(2u8) })
        .await
        .unwrap();

    let sweeper = cache.spawn_sweeper(Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(cache.len().await, 1, "expired entry should have been swept");
    sweeper.stop();
}
