//! End-to-end: collectors fed by a local indexer, scraped over HTTP.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::StatusCode;
use tokio::net::TcpListener;

use connext_exporter::{
    Collector, Gauge, HttpDocumentSource, LookupTables, MetricsRegistry, PriceCollector,
    QueryLimits, RemoteFetcher, RetryPolicy, RouterCollector, serve,
};

use common::spawn_upstream;

const ROUTER: &str = "0x9584eb0356a380b25d7ed2c14c54de58a25f2581";

async fn spawn_exporter(metrics: Arc<MetricsRegistry>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, metrics));
    addr
}

async fn spawn_indexer() -> SocketAddr {
    spawn_upstream(|path, _| {
        let body = if path.starts_with("/routers_with_balances") {
            r#"[
                {"domain":"6648936","local":"0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48","balance":2500000,"fees_earned":125000},
                {"domain":"6648936","local":"0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2","balance":3000000000000000000,"fees_earned":0}
            ]"#
        } else if path.starts_with("/transfers") && path.contains("routers=cs.") {
            r#"[{"status":"XCalled"},{"status":"CompletedFast"},{"status":"CompletedFast"}]"#
        } else if path.starts_with("/transfers") {
            r#"[{"status":"Executed"},{"status":"Reconciled"},{"status":"SomethingNew"}]"#
        } else if path.starts_with("/api/getETHprice") {
            r#"{"success":true,"data":{"price":1834.5}}"#
        } else {
            return (StatusCode::NOT_FOUND, "{}".to_string());
        };
        (StatusCode::OK, body.to_string())
    })
    .await
}

fn series_line<'a>(text: &'a str, name: &str, labels: &[&str]) -> Option<&'a str> {
    text.lines().find(|line| {
        line.starts_with(&format!("{name}{{")) && labels.iter().all(|l| line.contains(l))
    })
}

#[tokio::test]
async fn scrape_exposes_collected_gauges() {
    let indexer = spawn_indexer().await;
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let fetcher = Arc::new(RemoteFetcher::new(
        HttpDocumentSource::new().unwrap(),
        RetryPolicy::default(),
    ));

    let router = RouterCollector::new(
        fetcher.clone(),
        format!("http://{indexer}/"),
        ROUTER,
        QueryLimits::default(),
        Arc::new(LookupTables::connext()),
        metrics.clone(),
    );
    let price = PriceCollector::new(
        fetcher,
        format!("http://{indexer}/api/getETHprice"),
        metrics.clone(),
    )
    .unwrap();

    router.collect().await.unwrap();
    price.collect().await.unwrap();

    let exporter = spawn_exporter(metrics.clone()).await;
    let resp = reqwest::get(format!("http://{exporter}/metrics")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers()[reqwest::header::CONTENT_TYPE],
        "text/plain; version=0.0.4"
    );
    let text = resp.text().await.unwrap();

    let usdc = series_line(
        &text,
        "connext_router_liquidity",
        &[r#"domain="Ethereum""#, r#"asset="USDC""#],
    )
    .expect("USDC liquidity series");
    assert!(usdc.ends_with(" 2.5"), "{usdc}");

    let weth = series_line(
        &text,
        "connext_router_liquidity",
        &[r#"domain="Ethereum""#, r#"asset="WETH""#],
    )
    .expect("WETH liquidity series");
    assert!(weth.ends_with(" 3"), "{weth}");

    let fees = series_line(&text, "connext_router_fees_earned", &[r#"asset="USDC""#])
        .expect("USDC fees series");
    assert!(fees.ends_with(" 0.125"), "{fees}");

    let fast = series_line(&text, "connext_transfers", &[r#"status="CompletedFast""#])
        .expect("router CompletedFast series");
    assert!(fast.ends_with(" 2"), "{fast}");

    let reconciled = series_line(&text, "connext_transfers_all", &[r#"status="Reconciled""#])
        .expect("network Reconciled series");
    assert!(reconciled.ends_with(" 1"), "{reconciled}");
    assert!(!text.contains("SomethingNew"));

    let price_line = series_line(&text, "connext_ETH_price", &[r#"rpc_host="127.0.0.1""#])
        .expect("price series");
    assert!(price_line.ends_with(" 1834.5"), "{price_line}");

    // Five tracked statuses per scope, zeros included.
    assert_eq!(metrics.series_count(Gauge::Transfers), 5);
    assert_eq!(metrics.series_count(Gauge::TransfersAll), 5);
}

#[tokio::test]
async fn root_points_to_metrics_and_unknown_paths_are_404() {
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let exporter = spawn_exporter(metrics).await;

    let root = reqwest::get(format!("http://{exporter}/")).await.unwrap();
    assert_eq!(root.status(), reqwest::StatusCode::OK);
    assert!(root.text().await.unwrap().contains("/metrics"));

    let missing = reqwest::get(format!("http://{exporter}/healthz")).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let post = reqwest::Client::new()
        .post(format!("http://{exporter}/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(post.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_registry_scrapes_as_empty_body() {
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let exporter = spawn_exporter(metrics).await;

    let resp = reqwest::get(format!("http://{exporter}/metrics")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.text().await.unwrap().trim().is_empty());
}
