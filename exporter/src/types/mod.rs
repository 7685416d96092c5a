//! Wire and domain types shared by the collectors.
//!
//! Response records mirror the JSON returned by the Connext PostgREST
//! indexer and the price feed. The upstream schema omits empty fields, so
//! every field decodes with a default instead of failing the whole
//! document.

use serde::{Deserialize, Deserializer, Serialize};

/// Transfer records and status aggregation.
pub mod transfer;

pub use transfer::{StatusCounts, TransferRecord, TransferStatus};

/// Decodes an explicit JSON `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row of `routers_with_balances`: a router's position in one asset on
/// one domain.
///
/// `balance` and `fees_earned` are raw integer amounts in the asset's
/// smallest unit; see [`crate::tables::LookupTables::normalize`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterBalance {
    /// Connext domain id of the chain holding the liquidity.
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain: String,
    /// Local asset address on that domain.
    #[serde(default, rename = "local", deserialize_with = "null_as_default")]
    pub asset: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fees_earned: f64,
}

/// Response of the ETH price feed: `{"data": {"price": 1234.5}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: PriceData,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
}

/// RPC providers configured for a single chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainProviderConfig {
    /// Connext domain id of the chain.
    pub chain: String,
    /// Provider URLs, polled in this order.
    pub providers: Vec<String>,
}
