//! Fetching and decoding JSON documents from remote APIs.
//!
//! Two failure modes are handled differently:
//!
//! - transport errors (connection refused, timeout, ...) are returned to
//!   the caller immediately as [`FetchError::Transport`];
//! - decode errors (the body is not the expected JSON) are absorbed: the
//!   fetcher waits [`RetryPolicy::delay`] and repeats the GET, for as many
//!   attempts as the policy allows. The production policy never gives up,
//!   because the indexer occasionally serves truncated or error pages
//!   under load.
//!
//! The HTTP layer itself sits behind [`DocumentSource`] so the retry
//! logic can be exercised without a network.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub use http::HttpDocumentSource;

/// Delay between attempts when a response fails to decode.
pub const RETRY_FETCH_INTERVAL: Duration = Duration::from_secs(5);

/// Per-request timeout for outgoing HTTP calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors returned by [`RemoteFetcher`] and [`DocumentSource`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be completed (DNS, connect, timeout, ...).
    #[error("GET {url} failed: {reason}")]
    Transport { url: String, reason: String },
    /// The body never decoded within the retry policy's attempt budget.
    #[error("could not decode response from {url} after {attempts} attempts: {reason}")]
    Decode {
        url: String,
        attempts: u32,
        reason: String,
    },
}

/// Fixed-interval retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between two attempts.
    pub delay: Duration,
    /// Maximum number of attempts, `None` for unbounded.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retries forever every `delay`.
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Gives up after `max_attempts` attempts.
    pub fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(RETRY_FETCH_INTERVAL)
    }
}

/// Source of raw response bodies.
///
/// Implementations return the body of a GET to `url` whatever the HTTP
/// status; only failures to obtain a body at all are errors.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<S: DocumentSource + ?Sized> DocumentSource for std::sync::Arc<S> {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        (**self).get(url).await
    }
}

/// GET + JSON decode with fixed-interval retry on decode failure.
pub struct RemoteFetcher<S> {
    source: S,
    retry: RetryPolicy,
}

impl<S: DocumentSource> RemoteFetcher<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Fetches `url` and decodes the body as `T`.
    ///
    /// Suspends for as long as the upstream keeps returning bodies that do
    /// not decode and the policy allows further attempts.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let mut attempts = 0u32;
        loop {
            let body = self.source.get(url).await?;
            attempts += 1;

            match serde_json::from_str::<T>(&body) {
                Ok(value) => return Ok(value),
                Err(e) if self.retry.allows_retry(attempts) => {
                    tracing::warn!(
                        url,
                        attempt = attempts,
                        retry_in_secs = self.retry.delay.as_secs_f64(),
                        "decode error: {e}"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    return Err(FetchError::Decode {
                        url: url.to_string(),
                        attempts,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}
