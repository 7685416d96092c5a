//! Exporter configuration.
//!
//! Two JSON files configure a run:
//!
//! - `config.json` ([`ExporterConfig`]): network, router address, scrape
//!   intervals, query limits and the listen address;
//! - `router_config.json` ([`RouterConfig`]): the RPC providers to probe
//!   for each chain domain, in the same format the Connext router uses:
//!
//! ```json
//! { "chains": { "6648936": { "providers": ["https://eth.llamarpc.com"] } } }
//! ```
//!
//! Both are loaded once at startup. Any error here is fatal.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::types::ChainProviderConfig;

/// Lowest accepted router scrape interval.
pub const MIN_ROUTER_SCRAPE_INTERVAL: Duration = Duration::from_secs(60);
/// Lowest accepted RPC scrape interval.
pub const MIN_RPC_SCRAPE_INTERVAL: Duration = Duration::from_secs(30);
/// Lowest accepted ETH price scrape interval.
pub const MIN_ETH_SCRAPE_INTERVAL: Duration = Duration::from_secs(300);

/// Default source of the `ETH_price` gauge.
pub const DEFAULT_ETH_PRICE_URL: &str = "https://api.curve.fi/api/getETHprice";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot identify network {0:?}, expected \"mainnet\" or \"testnet\"")]
    UnknownNetwork(String),
    #[error("no router address configured")]
    MissingRouter,
    #[error("invalid listen address {host}:{port}: {reason}")]
    ListenAddr {
        host: String,
        port: u16,
        reason: String,
    },
}

/// Connext deployment to monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }

    /// Base URL of the indexer's PostgREST API, with a trailing slash.
    pub fn base_endpoint(self) -> &'static str {
        match self {
            Network::Mainnet => "https://postgrest.mainnet.connext.ninja/",
            Network::Testnet => "https://postgrest.testnet.connext.ninja/",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

/// How many transfers each status query samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryLimits {
    /// Window for the router-scoped `transfers` gauge.
    pub router: u32,
    /// Window for the network-wide `transfers_all` gauge.
    pub network: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            router: 100,
            network: 1000,
        }
    }
}

/// Contents of `config.json`.
///
/// Keys keep the exporter's historical spelling (`RPCScrapeInterval`,
/// `ETHScrapeInterval`, ...). Intervals are in seconds; values below the
/// per-collector floor are raised by the scheduler.
#[derive(Clone, Debug, Deserialize)]
pub struct ExporterConfig {
    #[serde(rename = "Network")]
    pub network: String,
    /// Router address, e.g. `0x9584eb0356a380b25d7ed2c14c54de58a25f2581`.
    #[serde(rename = "Router", default)]
    pub router: String,
    #[serde(rename = "RouterScrapeInterval", default = "default_router_interval")]
    pub router_scrape_interval: u64,
    #[serde(rename = "RPCScrapeInterval", default = "default_rpc_interval")]
    pub rpc_scrape_interval: u64,
    #[serde(rename = "ETHScrapeInterval", default = "default_eth_interval")]
    pub eth_scrape_interval: u64,
    #[serde(rename = "RouterQueryLimit", default = "default_router_query_limit")]
    pub router_query_limit: u32,
    #[serde(rename = "NetworkQueryLimit", default = "default_network_query_limit")]
    pub network_query_limit: u32,
    #[serde(rename = "Host", default = "default_host")]
    pub host: String,
    #[serde(rename = "Port", default = "default_port")]
    pub port: u16,
    #[serde(rename = "ETHPriceURL", default = "default_eth_price_url")]
    pub eth_price_url: String,
}

fn default_router_interval() -> u64 {
    MIN_ROUTER_SCRAPE_INTERVAL.as_secs()
}

fn default_rpc_interval() -> u64 {
    MIN_RPC_SCRAPE_INTERVAL.as_secs()
}

fn default_eth_interval() -> u64 {
    MIN_ETH_SCRAPE_INTERVAL.as_secs()
}

fn default_router_query_limit() -> u32 {
    QueryLimits::default().router
}

fn default_network_query_limit() -> u32 {
    QueryLimits::default().network
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_eth_price_url() -> String {
    DEFAULT_ETH_PRICE_URL.to_string()
}

impl ExporterConfig {
    /// Reads and validates `config.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let cfg: Self = read_json(path.as_ref())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks everything that would otherwise fail after collectors start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network()?;
        if self.router.trim().is_empty() {
            return Err(ConfigError::MissingRouter);
        }
        self.listen_addr()?;
        Ok(())
    }

    pub fn network(&self) -> Result<Network, ConfigError> {
        Network::parse(&self.network)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|e| ConfigError::ListenAddr {
            host: self.host.clone(),
            port: self.port,
            reason: format!("{e}"),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            router: self.router_query_limit,
            network: self.network_query_limit,
        }
    }

    pub fn router_interval(&self) -> Duration {
        Duration::from_secs(self.router_scrape_interval)
    }

    pub fn rpc_interval(&self) -> Duration {
        Duration::from_secs(self.rpc_scrape_interval)
    }

    pub fn eth_interval(&self) -> Duration {
        Duration::from_secs(self.eth_scrape_interval)
    }
}

/// Per-chain settings in `router_config.json`. Other keys the router
/// itself understands (assets, confirmations, ...) are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChainSettings {
    #[serde(default)]
    pub providers: Vec<String>,
}

/// Contents of `router_config.json`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub chains: BTreeMap<String, ChainSettings>,
}

impl RouterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_json(path.as_ref())
    }

    /// Providers per chain, ordered by domain id.
    pub fn chain_providers(&self) -> Vec<ChainProviderConfig> {
        self.chains
            .iter()
            .map(|(chain, settings)| ChainProviderConfig {
                chain: chain.clone(),
                providers: settings.providers.clone(),
            })
            .collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
