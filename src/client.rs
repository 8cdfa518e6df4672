//! Throttled fetch wrapper around a collaborator API client.
//!
//! The core never speaks a wire format itself; it consumes an [`ApiClient`]
//! collaborator and only requires a status code and a JSON body back.
//! [`ThrottledClient`] funnels every call through the shared
//! [`RateLimiter`](crate::limiter::RateLimiter) and owns the retry policy:
//! HTTP 429 backs off exponentially, other non-success statuses retry up to
//! the ceiling, and when the ceiling is exhausted the *last response* is
//! returned rather than an error so callers can inspect the status.

use async_trait::async_trait;
use miette::Diagnostic;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::limiter::{Credential, RateLimiter};

/// Query parameters for one fetch: pagination plus free-form extras.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub extra: FxHashMap<String, String>,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Minimal response surface the engine requires: status code and JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn status_only(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport-level failures below the HTTP status line.
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("transport failure fetching {route}: {message}")]
    #[diagnostic(
        code(assetgraph::client::transport),
        help("Status-level failures are returned as ApiResponse, not as this error.")
    )]
    Transport { route: String, message: String },
}

/// Collaborator performing the actual request. Implementations live outside
/// the engine (HTTP client, fixture, replay harness).
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn fetch(
        &self,
        route: &str,
        params: &FetchParams,
        credential: &Credential,
    ) -> Result<ApiResponse, ClientError>;
}

/// Retry behavior for throttled fetches.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Clamped to at least 1.
    pub max_attempts: u32,
    /// Base delay for exponential backoff on 429 (`2^attempt × base`).
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Fetch client that rotates credentials, enforces global cadence, and
/// retries within policy.
///
/// Every attempt — success or failure — passes through the limiter and stamps
/// the shared last-call timestamp, so failed calls still count against the
/// global cadence.
pub struct ThrottledClient {
    inner: Arc<dyn ApiClient>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl ThrottledClient {
    pub fn new(inner: Arc<dyn ApiClient>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            inner,
            limiter,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Perform one paced fetch.
    ///
    /// Returns the first success, or — once the attempt ceiling is reached —
    /// the last response whatever its status. Only transport failures map to
    /// `Err`.
    pub async fn fetch(&self, route: &str, params: &FetchParams) -> Result<ApiResponse, ClientError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let credential = self.limiter.pace().await;
            let outcome = self.inner.fetch(route, params, &credential).await;
            // Failed calls still consume budget.
            self.limiter.record().await;
            let response = outcome?;

            if response.is_success() {
                return Ok(response);
            }
            attempt += 1;
            if attempt >= attempts {
                tracing::warn!(route, status = response.status, "retry ceiling reached, returning last response");
                return Ok(response);
            }
            if response.is_rate_limited() {
                let backoff = backoff_delay(self.retry.base_delay, attempt);
                tracing::warn!(
                    route,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(backoff).await;
            } else {
                tracing::warn!(route, status = response.status, attempt, "non-success response, retrying");
            }
        }
    }
}

/// `2^attempt × base`, capped, with a small jitter so concurrent workers
/// don't retry in lockstep.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(10));
    let jitter = rand::rng().random_range(0..50);
    base.saturating_mul(factor) + Duration::from_millis(jitter)
}
