//! Credential rotation and global request spacing.
//!
//! The external API grants each credential a fixed hourly request ceiling.
//! With `N` credentials rotating round-robin and `R` requests per hour per
//! credential, the safe global cadence is one request every `3600 / (N × R)`
//! seconds — enforced across *all* callers through a shared last-call
//! timestamp, not per credential.
//!
//! The limiter is the sole enforcement point for request cadence: any
//! concurrency scheme above it stays correct as long as every fetch path
//! passes through [`RateLimiter::pace`] / [`RateLimiter::record`].

use async_trait::async_trait;
use chrono::Utc;
use miette::Diagnostic;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// One API credential handed out by round-robin rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

/// Errors raised constructing or consulting a rate limiter.
#[derive(Debug, Error, Diagnostic)]
pub enum LimiterError {
    /// No API credentials configured. Fatal at startup, not recoverable
    /// per-call.
    #[error("no API credentials configured")]
    #[diagnostic(
        code(assetgraph::limiter::missing_credential),
        help("Provide at least one credential and a nonzero hourly ceiling.")
    )]
    MissingCredential,
}

/// Shared store for the global last-call timestamp.
///
/// Multiple concurrent workers (possibly in separate processes) must see the
/// same last-call time, so the store lives behind a trait: an external
/// key-value store with per-call connect/disconnect is sufficient.
/// Read-then-write atomicity is best-effort — an occasional double-fire costs
/// a rate warning, not data corruption.
#[async_trait]
pub trait TimestampStore: Send + Sync {
    /// Unix-millisecond timestamp of the most recent request, if any.
    async fn last_call_millis(&self) -> Option<i64>;

    /// Record a request at the given unix-millisecond timestamp.
    async fn record_call_millis(&self, millis: i64);
}

/// Process-local timestamp store for tests and single-process runs.
#[derive(Default)]
pub struct MemoryTimestampStore {
    last: Mutex<Option<i64>>,
}

impl MemoryTimestampStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimestampStore for MemoryTimestampStore {
    async fn last_call_millis(&self) -> Option<i64> {
        *self.last.lock().await
    }

    async fn record_call_millis(&self, millis: i64) {
        *self.last.lock().await = Some(millis);
    }
}

/// Round-robin key rotator with a globally enforced minimum inter-request
/// interval.
///
/// Constructed once and passed by handle to every fetch call site; tests can
/// instantiate independent limiters with their own stores.
pub struct RateLimiter {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
    min_delay: Duration,
    store: Arc<dyn TimestampStore>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("credentials", &self.credentials)
            .field("cursor", &self.cursor)
            .field("min_delay", &self.min_delay)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Build a limiter over `credentials`, each allowed `requests_per_hour`.
    ///
    /// # Errors
    ///
    /// [`LimiterError::MissingCredential`] when no credentials are supplied
    /// or the hourly ceiling is zero.
    pub fn new(
        credentials: Vec<Credential>,
        requests_per_hour: u32,
        store: Arc<dyn TimestampStore>,
    ) -> Result<Self, LimiterError> {
        if credentials.is_empty() || requests_per_hour == 0 {
            return Err(LimiterError::MissingCredential);
        }
        let per_second = credentials.len() as f64 * f64::from(requests_per_hour) / 3600.0;
        let min_delay = Duration::from_secs_f64(1.0 / per_second);
        Ok(Self {
            credentials,
            cursor: AtomicUsize::new(0),
            min_delay,
            store,
        })
    }

    /// The enforced minimum spacing between any two requests.
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Hand out the next credential, round-robin.
    pub fn rotate(&self) -> &Credential {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.credentials.len();
        &self.credentials[index]
    }

    /// Acquire the next credential and suspend until the global cadence
    /// allows another request.
    ///
    /// This is the engine's only intentional suspension point. The caller
    /// performs its request afterwards and then invokes
    /// [`record`](Self::record) unconditionally — failed calls still count
    /// against the cadence.
    pub async fn pace(&self) -> Credential {
        let credential = self.rotate().clone();
        if let Some(last) = self.store.last_call_millis().await {
            let elapsed = (Utc::now().timestamp_millis() - last).max(0) as u64;
            let min_millis = self.min_delay.as_millis() as u64;
            if elapsed < min_millis {
                let wait = Duration::from_millis(min_millis - elapsed);
                tracing::debug!(wait_ms = wait.as_millis() as u64, "throttling request");
                tokio::time::sleep(wait).await;
            }
        }
        credential
    }

    /// Stamp "now" into the shared store. Call after every request, success
    /// or failure.
    pub async fn record(&self) {
        self.store.record_call_millis(Utc::now().timestamp_millis()).await;
    }
}
