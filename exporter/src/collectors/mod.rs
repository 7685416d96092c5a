//! Metric collectors.
//!
//! A [`Collector`] runs one collection cycle: it queries its upstream,
//! normalizes the result and writes gauges into the shared
//! [`crate::metrics::MetricsRegistry`]. Scheduling, retries between cycles
//! and error logging live in [`crate::scheduler`].
//!
//! - [`router::RouterCollector`]: router liquidity, fees and transfer
//!   status counts from the Connext indexer.
//! - [`rpc::ChainRpcCollector`]: latest block height per RPC provider.
//! - [`price::PriceCollector`]: ETH price.

pub mod price;
pub mod router;
pub mod rpc;

use async_trait::async_trait;

pub use price::PriceCollector;
pub use router::RouterCollector;
pub use rpc::ChainRpcCollector;

use crate::fetch::FetchError;
use crate::metrics::MetricsError;

/// Errors that end a collection cycle early.
///
/// None of them clears gauges written earlier; the last good value stays
/// exported until a later cycle overwrites it.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    /// The price feed answered with a zero price.
    #[error("price unavailable from {source_url}")]
    PriceUnavailable { source_url: String },
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One periodic source of metrics.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs one collection cycle.
    async fn collect(&self) -> Result<(), CollectError>;
}

#[async_trait]
impl<C: Collector + ?Sized> Collector for std::sync::Arc<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn collect(&self) -> Result<(), CollectError> {
        (**self).collect().await
    }
}

/// Hostname of `url`, used as the `rpc_host` label.
pub fn host_label(url: &str) -> Result<String, CollectError> {
    let parsed = url::Url::parse(url).map_err(|e| CollectError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .ok_or_else(|| CollectError::InvalidUrl {
            url: url.to_string(),
            reason: "no host".to_string(),
        })
}
