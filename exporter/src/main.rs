//! Connext exporter binary.
//!
//! Loads `config.json` and `router_config.json`, starts the `/metrics`
//! endpoint and runs the router, RPC and price collectors, each on its own
//! schedule, until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use connext_exporter::config::{
    MIN_ETH_SCRAPE_INTERVAL, MIN_ROUTER_SCRAPE_INTERVAL, MIN_RPC_SCRAPE_INTERVAL,
};
use connext_exporter::{
    ChainRpcCollector, ExporterConfig, HttpDocumentSource, JsonRpcConnector, LookupTables,
    MetricsRegistry, PeriodicTask, PriceCollector, RemoteFetcher, RetryPolicy, RouterCollector,
    RouterConfig, run_prometheus_http_server,
};

/// Prometheus exporter for a Connext router.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Exporter configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Router configuration file holding the RPC providers per chain
    #[arg(short, long, default_value = "router_config.json")]
    router_config: PathBuf,

    /// Log filter, used when RUST_LOG is not set
    #[arg(short, long, default_value = "connext_exporter=info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, args.json_logs) {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str, json: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| format!("invalid log filter {level:?}: {e}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();

    Ok(())
}

async fn run(args: Args) -> Result<(), String> {
    let cfg = ExporterConfig::load(&args.config).map_err(|e| e.to_string())?;
    let router_cfg = RouterConfig::load(&args.router_config).map_err(|e| e.to_string())?;

    let network = cfg.network().map_err(|e| e.to_string())?;
    let listen_addr = cfg.listen_addr().map_err(|e| e.to_string())?;
    tracing::info!(network = network.as_str(), router = %cfg.router, "starting exporter");

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new()
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = run_prometheus_http_server(metrics_clone, listen_addr).await {
            tracing::error!("metrics HTTP server error: {e}");
        }
    });

    // ---------------------------
    // Collectors
    // ---------------------------

    let tables = Arc::new(LookupTables::connext());
    let http = HttpDocumentSource::new().map_err(|e| e.to_string())?;
    let fetcher = Arc::new(RemoteFetcher::new(http, RetryPolicy::default()));

    let router = RouterCollector::new(
        fetcher.clone(),
        network.base_endpoint(),
        cfg.router.clone(),
        cfg.query_limits(),
        tables.clone(),
        metrics.clone(),
    );

    let chains = router_cfg.chain_providers();
    let rpc = ChainRpcCollector::new(
        chains,
        JsonRpcConnector::default(),
        tables.clone(),
        metrics.clone(),
    );
    tracing::info!(providers = rpc.provider_count(), "rpc providers configured");

    let price = PriceCollector::new(fetcher, cfg.eth_price_url.clone(), metrics.clone())
        .map_err(|e| format!("invalid ETH price URL: {e}"))?;

    let handles = [
        PeriodicTask::new("router", cfg.router_interval(), MIN_ROUTER_SCRAPE_INTERVAL)
            .spawn(router),
        PeriodicTask::new("rpc", cfg.rpc_interval(), MIN_RPC_SCRAPE_INTERVAL).spawn(rpc),
        PeriodicTask::new("eth_price", cfg.eth_interval(), MIN_ETH_SCRAPE_INTERVAL)
            .with_cycle_retry(RetryPolicy::default())
            .spawn(price),
    ];

    shutdown_signal().await;
    for handle in handles {
        handle.abort();
    }

    Ok(())
}

/// Waits for Ctrl-C and returns.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
