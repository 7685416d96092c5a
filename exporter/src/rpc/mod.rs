//! Chain RPC capability: connect to a provider and read its latest block.
//!
//! [`RpcConnector`] produces one [`BlockNumberClient`] per provider URL.
//! The RPC collector connects afresh on every cycle, so connectors should
//! not cache clients across calls.

pub mod json_rpc;

use async_trait::async_trait;

pub use json_rpc::{JsonRpcClient, JsonRpcConnector};

/// Errors raised while talking to a chain RPC provider.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The provider URL is unusable or the client could not be created.
    #[error("cannot connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    /// The request was sent but no response came back.
    #[error("RPC request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    /// The provider answered with a JSON-RPC error or a malformed result.
    #[error("bad RPC response from {url}: {reason}")]
    Protocol { url: String, reason: String },
}

/// A connected provider.
#[async_trait]
pub trait BlockNumberClient: Send + Sync {
    /// Height of the provider's latest block.
    async fn block_number(&self) -> Result<u64, RpcError>;
}

/// Factory for [`BlockNumberClient`]s.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    type Client: BlockNumberClient;

    async fn connect(&self, url: &str) -> Result<Self::Client, RpcError>;
}

/// Parses a JSON-RPC hex quantity such as `"0x10d4f"`.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
