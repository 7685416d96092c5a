//! JSON-RPC over HTTP(S), the transport every EVM provider speaks.
//!
//! Only `eth_blockNumber` is needed:
//!
//! ```json
//! POST <provider>
//! {"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 1}
//!
//! {"jsonrpc": "2.0", "id": 1, "result": "0x10d4f"}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{BlockNumberClient, RpcConnector, RpcError, parse_quantity};
use crate::fetch::REQUEST_TIMEOUT;

/// Builds a new HTTP client for every provider it connects to.
#[derive(Clone, Debug)]
pub struct JsonRpcConnector {
    timeout: Duration,
}

impl JsonRpcConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for JsonRpcConnector {
    fn default() -> Self {
        Self::new(REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl RpcConnector for JsonRpcConnector {
    type Client = JsonRpcClient;

    async fn connect(&self, url: &str) -> Result<JsonRpcClient, RpcError> {
        let connect_err = |reason: String| RpcError::Connect {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url).map_err(|e| connect_err(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(connect_err(format!(
                "unsupported scheme {:?}, expected http or https",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| connect_err(format!("failed to build HTTP client: {e}")))?;

        Ok(JsonRpcClient {
            url: parsed,
            client,
        })
    }
}

/// Client bound to a single provider URL.
pub struct JsonRpcClient {
    url: Url,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [serde_json::Value],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl BlockNumberClient for JsonRpcClient {
    async fn block_number(&self) -> Result<u64, RpcError> {
        let url = self.url.as_str();
        let req = RpcRequest {
            jsonrpc: "2.0",
            method: "eth_blockNumber",
            params: &[],
            id: 1,
        };

        let resp = self
            .client
            .post(self.url.clone())
            .json(&req)
            .send()
            .await
            .map_err(|e| RpcError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.json::<RpcResponse>().await.map_err(|e| RpcError::Protocol {
            url: url.to_string(),
            reason: format!("HTTP {status}: {e}"),
        })?;

        quantity_from_response(body).map_err(|reason| RpcError::Protocol {
            url: url.to_string(),
            reason,
        })
    }
}

fn quantity_from_response(resp: RpcResponse) -> Result<u64, String> {
    if let Some(err) = resp.error {
        return Err(format!("error {}: {}", err.code, err.message));
    }
    let result = resp.result.ok_or_else(|| "missing result".to_string())?;
    parse_quantity(&result).ok_or_else(|| format!("invalid quantity {result:?}"))
}
