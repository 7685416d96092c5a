//! Prometheus-backed gauge registry and HTTP exporter.
//!
//! [`MetricsRegistry`] owns a Prometheus registry with the exporter's six
//! gauge families registered under the `connext_` namespace. Collectors
//! write through [`MetricsRegistry::set_gauge`]; the HTTP exporter reads
//! through [`MetricsRegistry::gather_text`]. Each series is an atomic
//! `f64` inside the `prometheus` crate, so writers and readers never need
//! an external lock.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{self, Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// Namespace prepended to every gauge name.
pub const NAMESPACE: &str = "connext";

/// Errors raised by [`MetricsRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to set {gauge}: {source}")]
    Set {
        gauge: &'static str,
        #[source]
        source: prometheus::Error,
    },
    #[error("failed to register metrics: {0}")]
    Register(#[from] prometheus::Error),
}

/// The gauge families exported by this process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gauge {
    /// Normalized router balance, `{domain, asset}`.
    RouterLiquidity,
    /// Normalized fees earned by the router, `{domain, asset}`.
    RouterFeesEarned,
    /// Router-scoped transfer count per status, `{status}`.
    Transfers,
    /// Network-wide transfer count per status, `{status}`.
    TransfersAll,
    /// Latest block per provider, `{domain, rpc_host}`.
    RpcBlockNumber,
    /// ETH price per price source, `{rpc_host}`.
    EthPrice,
}

impl Gauge {
    pub const ALL: [Gauge; 6] = [
        Gauge::RouterLiquidity,
        Gauge::RouterFeesEarned,
        Gauge::Transfers,
        Gauge::TransfersAll,
        Gauge::RpcBlockNumber,
        Gauge::EthPrice,
    ];

    /// Metric name without the namespace.
    pub fn name(self) -> &'static str {
        match self {
            Gauge::RouterLiquidity => "router_liquidity",
            Gauge::RouterFeesEarned => "router_fees_earned",
            Gauge::Transfers => "transfers",
            Gauge::TransfersAll => "transfers_all",
            Gauge::RpcBlockNumber => "RPC_block_number",
            Gauge::EthPrice => "ETH_price",
        }
    }

    /// Fully-qualified name as it appears in the exposition.
    pub fn full_name(self) -> String {
        format!("{NAMESPACE}_{}", self.name())
    }

    fn help(self) -> &'static str {
        match self {
            Gauge::RouterLiquidity => "Router liquidity per domain and asset",
            Gauge::RouterFeesEarned => "Router fees earned per domain and asset",
            Gauge::Transfers => "Router transfers in the latest window per status",
            Gauge::TransfersAll => "Network-wide transfers in the latest window per status",
            Gauge::RpcBlockNumber => "Latest block number reported by each RPC provider",
            Gauge::EthPrice => "Latest ETH price",
        }
    }

    /// Ordered label keys.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Gauge::RouterLiquidity | Gauge::RouterFeesEarned => &["domain", "asset"],
            Gauge::Transfers | Gauge::TransfersAll => &["status"],
            Gauge::RpcBlockNumber => &["domain", "rpc_host"],
            Gauge::EthPrice => &["rpc_host"],
        }
    }
}

/// One exported series.
#[derive(Clone, Debug, PartialEq)]
pub struct GaugeSample {
    /// Fully-qualified metric name.
    pub name: String,
    /// `(label, value)` pairs, sorted by label name.
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

/// Wrapper around a Prometheus registry and the exporter's gauges.
///
/// This is the main handle passed to collectors and the HTTP exporter.
/// Wrap it in an [`Arc`] to share it across tasks.
pub struct MetricsRegistry {
    registry: Registry,
    /// Indexed by `Gauge as usize`.
    gauges: Vec<GaugeVec>,
}

impl MetricsRegistry {
    /// Creates a fresh registry with every gauge family registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;

        let mut gauges = Vec::with_capacity(Gauge::ALL.len());
        for gauge in Gauge::ALL {
            let vec = GaugeVec::new(Opts::new(gauge.name(), gauge.help()), gauge.labels())?;
            registry.register(Box::new(vec.clone()))?;
            gauges.push(vec);
        }

        Ok(Self { registry, gauges })
    }

    fn vec(&self, gauge: Gauge) -> &GaugeVec {
        &self.gauges[gauge as usize]
    }

    /// Sets the series of `gauge` identified by `label_values`, given in
    /// the order of [`Gauge::labels`].
    pub fn set_gauge(
        &self,
        gauge: Gauge,
        label_values: &[&str],
        value: f64,
    ) -> Result<(), MetricsError> {
        self.vec(gauge)
            .get_metric_with_label_values(label_values)
            .map(|g| g.set(value))
            .map_err(|source| MetricsError::Set {
                gauge: gauge.name(),
                source,
            })
    }

    /// Every series that has been set so far.
    pub fn snapshot(&self) -> Vec<GaugeSample> {
        self.registry
            .gather()
            .iter()
            .flat_map(|family| {
                family.get_metric().iter().map(move |m| GaugeSample {
                    name: family.get_name().to_string(),
                    labels: m
                        .get_label()
                        .iter()
                        .map(|l| (l.get_name().to_string(), l.get_value().to_string()))
                        .collect(),
                    value: m.get_gauge().get_value(),
                })
            })
            .collect()
    }

    /// Current value of one series, or `None` if it was never set.
    ///
    /// Unlike [`GaugeVec::with_label_values`] this does not create the
    /// series as a side effect.
    pub fn sample(&self, gauge: Gauge, label_values: &[&str]) -> Option<f64> {
        let name = gauge.full_name();
        self.snapshot()
            .into_iter()
            .filter(|s| s.name == name)
            .find(|s| {
                gauge
                    .labels()
                    .iter()
                    .zip(label_values)
                    .all(|(key, want)| {
                        s.labels
                            .iter()
                            .any(|(k, v)| k.as_str() == *key && v.as_str() == *want)
                    })
                    && label_values.len() == gauge.labels().len()
            })
            .map(|s| s.value)
    }

    /// Number of series currently exported for `gauge`.
    pub fn series_count(&self, gauge: Gauge) -> usize {
        let name = gauge.full_name();
        self.snapshot().iter().filter(|s| s.name == name).count()
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Binds `addr` and serves metrics on it until the listener fails.
///
/// Intended to be spawned onto the runtime:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    serve(listener, metrics).await
}

/// Serves `GET /metrics` in the Prometheus text exposition format on an
/// already-bound listener. Every connection gets its own task.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<MetricsRegistry>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::debug!(%peer, "metrics connection error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let resp = match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => text_response(
            StatusCode::OK,
            "text/plain; version=0.0.4",
            metrics.gather_text(),
        ),
        (&Method::GET, "/") => text_response(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            "connext exporter\nmetrics: /metrics\n".to_string(),
        ),
        _ => text_response(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            "not found".to_string(),
        ),
    };
    Ok(resp)
}

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: String,
) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    resp
}
