//! Latest block height of every configured RPC provider.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectError, Collector, host_label};
use crate::metrics::{Gauge, MetricsRegistry};
use crate::rpc::{BlockNumberClient, RpcConnector};
use crate::tables::LookupTables;
use crate::types::ChainProviderConfig;

/// What happened to one provider during a cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderOutcome {
    Updated { height: u64 },
    /// Connected and answered, but reported height 0.
    ZeroHeight,
    Failed,
}

/// Schemes the JSON-RPC transport can dial.
const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Whether `url` can ever be probed. Providers that cannot are reported
/// once here instead of failing every cycle.
fn dialable(chain: &str, url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) if SUPPORTED_SCHEMES.contains(&parsed.scheme()) && parsed.has_host() => true,
        Ok(parsed) => {
            tracing::warn!(
                chain,
                scheme = parsed.scheme(),
                host = parsed.host_str().unwrap_or_default(),
                "ignoring RPC provider: only http and https endpoints are supported"
            );
            false
        }
        Err(e) => {
            tracing::warn!(chain, "ignoring RPC provider with invalid URL: {e}");
            false
        }
    }
}

/// Probes each provider of each chain and exports
/// `RPC_block_number{domain, rpc_host}`.
///
/// Providers are independent: a provider that cannot be reached is logged
/// and skipped, and its previous value (if any) stays exported. Providers
/// with a non-HTTP scheme (`ws://`, `wss://`, IPC paths) or an invalid URL
/// are dropped at construction.
pub struct ChainRpcCollector<C> {
    chains: Vec<ChainProviderConfig>,
    connector: C,
    tables: Arc<LookupTables>,
    metrics: Arc<MetricsRegistry>,
}

impl<C: RpcConnector> ChainRpcCollector<C> {
    pub fn new(
        chains: Vec<ChainProviderConfig>,
        connector: C,
        tables: Arc<LookupTables>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let chains = chains
            .into_iter()
            .map(|mut cfg| {
                cfg.providers.retain(|url| dialable(&cfg.chain, url));
                cfg
            })
            .collect();

        Self {
            chains,
            connector,
            tables,
            metrics,
        }
    }

    /// Number of provider URLs probed per cycle.
    pub fn provider_count(&self) -> usize {
        self.chains.iter().map(|c| c.providers.len()).sum()
    }

    async fn probe(&self, chain: &str, url: &str) -> ProviderOutcome {
        let host = match host_label(url) {
            Ok(host) => host,
            Err(e) => {
                tracing::warn!(chain, "skipping provider: {e}");
                return ProviderOutcome::Failed;
            }
        };

        let client = match self.connector.connect(url).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(chain, %host, "error connecting to RPC provider: {e}");
                return ProviderOutcome::Failed;
            }
        };

        let height = match client.block_number().await {
            Ok(0) => {
                tracing::warn!(chain, %host, "provider reported block 0, skipping");
                return ProviderOutcome::ZeroHeight;
            }
            Ok(height) => height,
            Err(e) => {
                tracing::warn!(chain, %host, "error fetching current block number: {e}");
                return ProviderOutcome::Failed;
            }
        };

        let domain = self.tables.domain_name(chain);
        match self
            .metrics
            .set_gauge(Gauge::RpcBlockNumber, &[domain, &host], height as f64)
        {
            Ok(()) => ProviderOutcome::Updated { height },
            Err(e) => {
                tracing::error!(chain, %host, "{e}");
                ProviderOutcome::Failed
            }
        }
    }

    /// Runs one cycle and reports the outcome per `(chain, provider)`, in
    /// probe order.
    pub async fn probe_all(&self) -> Vec<(String, String, ProviderOutcome)> {
        let mut outcomes = Vec::with_capacity(self.provider_count());
        for cfg in &self.chains {
            for url in &cfg.providers {
                let outcome = self.probe(&cfg.chain, url).await;
                outcomes.push((cfg.chain.clone(), url.clone(), outcome));
            }
        }
        outcomes
    }
}

#[async_trait]
impl<C: RpcConnector> Collector for ChainRpcCollector<C> {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn collect(&self) -> Result<(), CollectError> {
        let outcomes = self.probe_all().await;
        let updated = outcomes
            .iter()
            .filter(|(_, _, o)| matches!(o, ProviderOutcome::Updated { .. }))
            .count();

        tracing::debug!(
            updated,
            skipped = outcomes.len() - updated,
            total = outcomes.len(),
            "rpc cycle complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::{FakeConnector, Provider};

    fn chain(id: &str, providers: &[&str]) -> ChainProviderConfig {
        ChainProviderConfig {
            chain: id.to_string(),
            providers: providers.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn collector(
        chains: Vec<ChainProviderConfig>,
        connector: FakeConnector,
    ) -> (ChainRpcCollector<FakeConnector>, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        let c = ChainRpcCollector::new(
            chains,
            connector,
            Arc::new(LookupTables::connext()),
            metrics.clone(),
        );
        (c, metrics)
    }

    #[tokio::test]
    async fn healthy_providers_export_height_per_host() {
        let connector = FakeConnector::new()
            .with("https://eth.llamarpc.com", Provider::Height(18_000_000))
            .with("https://rpc.ankr.com/eth", Provider::Height(17_999_998))
            .with("https://polygon-rpc.com/", Provider::Height(49_000_000));
        let (c, m) = collector(
            vec![
                chain("6648936", &["https://eth.llamarpc.com", "https://rpc.ankr.com/eth"]),
                chain("1886350457", &["https://polygon-rpc.com/"]),
            ],
            connector,
        );

        c.collect().await.unwrap();

        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Ethereum", "eth.llamarpc.com"]),
            Some(18_000_000.0)
        );
        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Ethereum", "rpc.ankr.com"]),
            Some(17_999_998.0)
        );
        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Polygon", "polygon-rpc.com"]),
            Some(49_000_000.0)
        );
        assert_eq!(m.series_count(Gauge::RpcBlockNumber), 3);
    }

    #[tokio::test]
    async fn zero_height_produces_no_entry() {
        let connector = FakeConnector::new()
            .with("https://stale.example", Provider::Height(0))
            .with("https://fresh.example", Provider::Height(100));
        let (c, m) = collector(
            vec![chain("6778479", &["https://stale.example", "https://fresh.example"])],
            connector,
        );

        let outcomes = c.probe_all().await;

        assert_eq!(outcomes[0].2, ProviderOutcome::ZeroHeight);
        assert_eq!(outcomes[1].2, ProviderOutcome::Updated { height: 100 });
        assert_eq!(m.sample(Gauge::RpcBlockNumber, &["Gnosis", "stale.example"]), None);
        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Gnosis", "fresh.example"]),
            Some(100.0)
        );
        assert_eq!(m.series_count(Gauge::RpcBlockNumber), 1);
    }

    #[tokio::test]
    async fn failing_provider_does_not_stop_the_chain() {
        let connector = FakeConnector::new()
            .with("https://down.example", Provider::ConnectError)
            .with("https://flaky.example", Provider::ReadError)
            .with("https://up.example", Provider::Height(7));
        let (c, m) = collector(
            vec![chain(
                "31337",
                &[
                    "https://down.example",
                    "https://flaky.example",
                    "https://up.example",
                ],
            )],
            connector,
        );

        c.collect().await.expect("rpc cycle never fails as a whole");

        let outcomes: Vec<_> = c.probe_all().await.into_iter().map(|(_, _, o)| o).collect();
        assert_eq!(
            outcomes,
            vec![
                ProviderOutcome::Failed,
                ProviderOutcome::Failed,
                ProviderOutcome::Updated { height: 7 },
            ]
        );
        // Unknown domain passes through as its raw id.
        assert_eq!(m.sample(Gauge::RpcBlockNumber, &["31337", "up.example"]), Some(7.0));
        assert_eq!(m.series_count(Gauge::RpcBlockNumber), 1);
    }

    #[tokio::test]
    async fn undialable_providers_are_dropped_up_front() {
        let connector = FakeConnector::new().with("http://10.0.0.5:8545", Provider::Height(5));
        let (c, m) = collector(
            vec![chain(
                "6648936",
                &[
                    "wss://eth-mainnet.example/ws",
                    "ws://127.0.0.1:8546",
                    "not-a-url",
                    "unix:/var/run/geth.ipc",
                    "http://10.0.0.5:8545",
                ],
            )],
            connector,
        );

        assert_eq!(c.provider_count(), 1);

        c.collect().await.unwrap();
        c.collect().await.unwrap();

        assert_eq!(
            c.connector.connects(),
            vec!["http://10.0.0.5:8545", "http://10.0.0.5:8545"]
        );
        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Ethereum", "10.0.0.5"]),
            Some(5.0)
        );
    }

    #[tokio::test]
    async fn previous_value_survives_a_failed_probe() {
        let connector = FakeConnector::new().with("https://eth.example", Provider::Height(10));
        let (c, m) = collector(vec![chain("6648936", &["https://eth.example"])], connector);

        c.collect().await.unwrap();
        c.connector.set("https://eth.example", Provider::ReadError);
        c.collect().await.unwrap();
        c.connector.set("https://eth.example", Provider::Height(0));
        c.collect().await.unwrap();

        assert_eq!(
            m.sample(Gauge::RpcBlockNumber, &["Ethereum", "eth.example"]),
            Some(10.0)
        );
    }

    #[tokio::test]
    async fn connects_fresh_every_cycle_in_configured_order() {
        let connector = FakeConnector::new()
            .with("https://b.example", Provider::Height(1))
            .with("https://a.example", Provider::Height(2));
        let (c, _) = collector(
            vec![chain("9991", &["https://b.example", "https://a.example"])],
            connector,
        );

        c.collect().await.unwrap();
        c.collect().await.unwrap();

        assert_eq!(
            c.connector.connects(),
            vec![
                "https://b.example",
                "https://a.example",
                "https://b.example",
                "https://a.example",
            ]
        );
    }
}
