//! Router liquidity, fees and transfer status counts.
//!
//! One cycle issues three indexer queries, in this order:
//!
//! 1. `routers_with_balances` for the router: one row per `(domain,
//!    asset)`, scaled by the asset's decimals and exported as
//!    `router_liquidity` / `router_fees_earned`;
//! 2. the router's latest transfers, tallied by status into `transfers`;
//! 3. the network's latest transfers, tallied into `transfers_all`.
//!
//! The queries do not depend on each other. One that fails leaves its
//! gauges as they were and the others still run.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CollectError, Collector};
use crate::config::QueryLimits;
use crate::fetch::{DocumentSource, RemoteFetcher};
use crate::metrics::{Gauge, MetricsRegistry};
use crate::tables::LookupTables;
use crate::types::{RouterBalance, StatusCounts, TransferRecord};

/// Columns requested from the `transfers` view.
const TRANSFER_COLUMNS: &str =
    "status,origin_chain,destination_chain,xcall_timestamp,execute_timestamp";

/// `routers_with_balances` query for one router.
pub fn balances_url(base: &str, router: &str) -> String {
    format!("{base}routers_with_balances?address=eq.{router}")
}

/// Latest `limit` transfers, newest first, optionally restricted to the
/// transfers `router` took part in.
pub fn transfers_url(base: &str, limit: u32, router: Option<&str>) -> String {
    let mut url =
        format!("{base}transfers?select={TRANSFER_COLUMNS}&order=xcall_timestamp.desc&limit={limit}");
    if let Some(router) = router {
        url.push_str(&format!("&routers=cs.{{{router}}}"));
    }
    url
}

/// Collects router-level and network-level metrics from the indexer.
pub struct RouterCollector<S> {
    fetcher: Arc<RemoteFetcher<S>>,
    base_endpoint: String,
    router: String,
    limits: QueryLimits,
    tables: Arc<LookupTables>,
    metrics: Arc<MetricsRegistry>,
}

impl<S: DocumentSource> RouterCollector<S> {
    pub fn new(
        fetcher: Arc<RemoteFetcher<S>>,
        base_endpoint: impl Into<String>,
        router: impl Into<String>,
        limits: QueryLimits,
        tables: Arc<LookupTables>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            fetcher,
            base_endpoint: base_endpoint.into(),
            router: router.into(),
            limits,
            tables,
            metrics,
        }
    }

    async fn collect_balances(&self) -> Result<usize, CollectError> {
        let url = balances_url(&self.base_endpoint, &self.router);
        let rows: Vec<RouterBalance> = self.fetcher.fetch(&url).await?;

        for row in &rows {
            let domain = self.tables.domain_name(&row.domain);
            let asset = self.tables.asset_symbol(&row.asset);
            let liquidity = self.tables.normalize(&row.domain, &row.asset, row.balance);
            let fees = self
                .tables
                .normalize(&row.domain, &row.asset, row.fees_earned);

            self.metrics
                .set_gauge(Gauge::RouterLiquidity, &[domain, asset], liquidity)?;
            self.metrics
                .set_gauge(Gauge::RouterFeesEarned, &[domain, asset], fees)?;
        }

        Ok(rows.len())
    }

    async fn collect_transfers(
        &self,
        gauge: Gauge,
        limit: u32,
        router: Option<&str>,
    ) -> Result<StatusCounts, CollectError> {
        let url = transfers_url(&self.base_endpoint, limit, router);
        let rows: Vec<TransferRecord> = self.fetcher.fetch(&url).await?;

        let counts = StatusCounts::tally(&rows);
        for (status, count) in counts.iter() {
            self.metrics.set_gauge(gauge, &[status], count as f64)?;
        }
        Ok(counts)
    }
}

#[async_trait]
impl<S: DocumentSource> Collector for RouterCollector<S> {
    fn name(&self) -> &'static str {
        "router"
    }

    /// Runs the three queries independently. A failed query leaves its
    /// gauges untouched; the first error is returned once all have run.
    async fn collect(&self) -> Result<(), CollectError> {
        let balances = self.collect_balances().await;
        let router = self
            .collect_transfers(Gauge::Transfers, self.limits.router, Some(&self.router))
            .await;
        let network = self
            .collect_transfers(Gauge::TransfersAll, self.limits.network, None)
            .await;

        let mut first_err = None;
        let mut keep = |step: &'static str, err: CollectError| {
            tracing::warn!(router = %self.router, step, "router query failed: {err}");
            first_err.get_or_insert(err);
        };
        let balances = balances.map_err(|e| keep("balances", e)).ok();
        let router = router.map_err(|e| keep("router_transfers", e)).ok();
        let network = network.map_err(|e| keep("network_transfers", e)).ok();

        tracing::debug!(
            router = %self.router,
            balances = ?balances,
            router_transfers = ?router,
            network_transfers = ?network,
            "router cycle complete"
        );
        first_err.map_or(Ok(()), Err)
    }
}
