//! Connext exporter library crate.
//!
//! Polls three upstreams on independent schedules and exposes the results
//! as Prometheus gauges:
//!
//! - the Connext indexer (PostgREST) for router liquidity, fees earned and
//!   transfer status counts (`collectors::router`),
//! - chain JSON-RPC providers for their latest block height
//!   (`collectors::rpc`),
//! - an ETH price feed (`collectors::price`).
//!
//! The pieces are wired together by the `connext-exporter` binary; the
//! library exposes them separately so each can be driven in tests.

pub mod collectors;
pub mod config;
pub mod fetch;
pub mod metrics;
pub mod rpc;
pub mod scheduler;
pub mod tables;
pub mod types;

pub use collectors::{ChainRpcCollector, CollectError, Collector, PriceCollector, RouterCollector};
pub use config::{ConfigError, ExporterConfig, Network, QueryLimits, RouterConfig};
pub use fetch::{DocumentSource, FetchError, HttpDocumentSource, RemoteFetcher, RetryPolicy};
pub use metrics::{Gauge, MetricsError, MetricsRegistry, run_prometheus_http_server, serve};
pub use rpc::{BlockNumberClient, JsonRpcConnector, RpcConnector, RpcError};
pub use scheduler::PeriodicTask;
pub use tables::LookupTables;
pub use types::*;
