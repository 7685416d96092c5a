//! Metrics registry and the Prometheus `/metrics` exporter.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use connext_exporter::metrics::{Gauge, MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! tokio::spawn(run_prometheus_http_server(registry.clone(), "0.0.0.0:9090".parse()?));
//!
//! registry.set_gauge(Gauge::EthPrice, &["api.curve.fi"], 1834.2)?;
//! ```

pub mod prometheus;

pub use self::prometheus::{
    Gauge, GaugeSample, MetricsError, MetricsRegistry, NAMESPACE, run_prometheus_http_server,
    serve,
};
