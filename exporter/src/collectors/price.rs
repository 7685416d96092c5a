//! ETH reference price.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectError, Collector, host_label};
use crate::fetch::{DocumentSource, RemoteFetcher};
use crate::metrics::{Gauge, MetricsRegistry};
use crate::types::PriceDocument;

/// Fetches the ETH price and exports `ETH_price{rpc_host}`, labelled with
/// the price feed's hostname.
///
/// A zero price is reported as [`CollectError::PriceUnavailable`] and the
/// previous value stays exported; the scheduler retries the cycle.
pub struct PriceCollector<S> {
    fetcher: Arc<RemoteFetcher<S>>,
    url: String,
    host: String,
    metrics: Arc<MetricsRegistry>,
}

impl<S: DocumentSource> PriceCollector<S> {
    /// Fails if `url` has no hostname to label the gauge with.
    pub fn new(
        fetcher: Arc<RemoteFetcher<S>>,
        url: impl Into<String>,
        metrics: Arc<MetricsRegistry>,
    ) -> Result<Self, CollectError> {
        let url = url.into();
        let host = host_label(&url)?;
        Ok(Self {
            fetcher,
            url,
            host,
            metrics,
        })
    }
}

#[async_trait]
impl<S: DocumentSource> Collector for PriceCollector<S> {
    fn name(&self) -> &'static str {
        "eth_price"
    }

    async fn collect(&self) -> Result<(), CollectError> {
        let doc: PriceDocument = self.fetcher.fetch(&self.url).await?;
        let price = doc.data.price;

        if price == 0.0 {
            return Err(CollectError::PriceUnavailable {
                source_url: self.url.clone(),
            });
        }

        self.metrics
            .set_gauge(Gauge::EthPrice, &[&self.host], price)?;
        tracing::debug!(price, host = %self.host, "eth price updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ETH_PRICE_URL;
    use crate::fetch::RetryPolicy;
    use crate::fetch::testing::ScriptedSource;

    fn collector(
        source: Arc<ScriptedSource>,
    ) -> (PriceCollector<Arc<ScriptedSource>>, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let fetcher = Arc::new(RemoteFetcher::new(source, RetryPolicy::default()));
        let c = PriceCollector::new(fetcher, DEFAULT_ETH_PRICE_URL, metrics.clone()).unwrap();
        (c, metrics)
    }

    #[tokio::test]
    async fn positive_price_is_exported_by_host() {
        let source = Arc::new(ScriptedSource::new());
        source.respond(DEFAULT_ETH_PRICE_URL, r#"{"success":true,"data":{"price":1834.56}}"#);
        let (c, m) = collector(source);

        c.collect().await.unwrap();

        assert_eq!(m.sample(Gauge::EthPrice, &["api.curve.fi"]), Some(1834.56));
        assert_eq!(m.series_count(Gauge::EthPrice), 1);
    }

    #[tokio::test]
    async fn zero_price_keeps_previous_value() {
        let source = Arc::new(ScriptedSource::new());
        source.respond(DEFAULT_ETH_PRICE_URL, r#"{"data":{"price":1900}}"#);
        let (c, m) = collector(source.clone());
        c.collect().await.unwrap();

        source.reset(DEFAULT_ETH_PRICE_URL, r#"{"data":{"price":0}}"#);
        let err = c.collect().await.unwrap_err();

        assert!(matches!(err, CollectError::PriceUnavailable { .. }), "got {err:?}");
        assert_eq!(m.sample(Gauge::EthPrice, &["api.curve.fi"]), Some(1900.0));
    }

    #[tokio::test]
    async fn missing_price_counts_as_zero() {
        let source = Arc::new(ScriptedSource::new());
        source.respond(DEFAULT_ETH_PRICE_URL, r#"{"success":false}"#);
        let (c, m) = collector(source);

        assert!(matches!(
            c.collect().await,
            Err(CollectError::PriceUnavailable { .. })
        ));
        assert_eq!(m.series_count(Gauge::EthPrice), 0);
    }

    #[test]
    fn url_without_host_is_rejected() {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let fetcher = Arc::new(RemoteFetcher::new(
            Arc::new(ScriptedSource::new()),
            RetryPolicy::default(),
        ));
        assert!(PriceCollector::new(fetcher, "getETHprice", metrics).is_err());
    }
}
