//! Rate limiter and throttled client behavior under real time.

mod common;
use common::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use assetgraph::client::{FetchParams, RetryPolicy, ThrottledClient};
use assetgraph::limiter::{Credential, MemoryTimestampStore, RateLimiter, TimestampStore};

fn keys(n: usize) -> Vec<Credential> {
    (0..n).map(|i| Credential::new(format!("key-{i}"))).collect()
}

/// Back-to-back calls are spaced by at least 3600/(N x R) seconds of wall
/// clock. 1 key x 72_000 req/h gives a 50ms floor.
#[tokio::test(flavor = "multi_thread")]
async fn calls_are_spaced_by_global_minimum() {
    let store = Arc::new(MemoryTimestampStore::new());
    let limiter = Arc::new(RateLimiter::new(keys(1), 72_000, store).unwrap());
    assert_eq!(limiter.min_delay(), Duration::from_millis(50));

    let api = Arc::new(ScriptedApi::always_ok());
    let client = ThrottledClient::new(api.clone(), limiter);

    let started = Instant::now();
    for _ in 0..4 {
        let response = client.fetch("/bill", &FetchParams::new()).await.unwrap();
        assert!(response.is_success());
    }
    // Three enforced gaps between four calls. The shared store keeps whole
    // milliseconds, so each gap may undershoot by a fraction of one.
    assert!(
        started.elapsed() >= Duration::from_millis(147),
        "calls were not paced: {:?}",
        started.elapsed()
    );
    assert_eq!(api.call_count(), 4);
}

#[tokio::test]
async fn credentials_rotate_round_robin_across_calls() {
    let store = Arc::new(MemoryTimestampStore::new());
    // Large ceiling so pacing stays negligible.
    let limiter = Arc::new(RateLimiter::new(keys(3), 3_600_000, store).unwrap());
    let api = Arc::new(ScriptedApi::always_ok());
    let client = ThrottledClient::new(api.clone(), limiter);

    for _ in 0..5 {
        client.fetch("/members", &FetchParams::new()).await.unwrap();
    }
    assert_eq!(
        api.seen_credentials(),
        vec!["key-0", "key-1", "key-2", "key-0", "key-1"]
    );
}

#[tokio::test]
async fn rate_limited_calls_back_off_until_success() {
    let store = Arc::new(MemoryTimestampStore::new());
    let limiter = Arc::new(RateLimiter::new(keys(1), 3_600_000, store).unwrap());
    let api = Arc::new(ScriptedApi::new(vec![429, 429, 200]));
    let client = ThrottledClient::new(api.clone(), limiter).with_retry(RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
    });

    let response = client.fetch("/bills", &FetchParams::new()).await.unwrap();
    assert!(response.is_success());
    assert_eq!(api.call_count(), 3);
}

#[tokio::test]
async fn exhausted_retries_return_last_response_not_error() {
    let store = Arc::new(MemoryTimestampStore::new());
    let limiter = Arc::new(RateLimiter::new(keys(1), 3_600_000, store).unwrap());
    let api = Arc::new(ScriptedApi::new(vec![500]));
    let client = ThrottledClient::new(api.clone(), limiter).with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    });

    let response = client.fetch("/bills", &FetchParams::new()).await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(api.call_count(), 3, "retried up to the ceiling");
}

#[tokio::test]
async fn failed_calls_still_consume_rate_budget() {
    let store = Arc::new(MemoryTimestampStore::new());
    let limiter = Arc::new(RateLimiter::new(keys(1), 3_600_000, store.clone()).unwrap());
    let api = Arc::new(ScriptedApi::new(vec![500]));
    let client = ThrottledClient::new(api, limiter).with_retry(RetryPolicy {
        max_attempts: 1,
        base_delay: Duration::from_millis(1),
    });

    assert!(store.last_call_millis().await.is_none());
    let response = client.fetch("/bills", &FetchParams::new()).await.unwrap();
    assert_eq!(response.status, 500);
    assert!(
        store.last_call_millis().await.is_some(),
        "failure must still stamp the shared timestamp"
    );
}
