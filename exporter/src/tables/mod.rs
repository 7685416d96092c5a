//! Static reference tables used to turn opaque identifiers into labels.
//!
//! The Connext indexer reports chains by their Connext domain id (e.g.
//! `"6648936"` for Ethereum) and assets by their local contract address.
//! [`LookupTables`] maps both to human-readable names and records how many
//! decimals each asset uses on each domain so raw integer balances can be
//! scaled into token units.
//!
//! Every lookup has a fallback: names pass the raw identifier through and
//! decimals default to [`DEFAULT_DECIMALS`]. A label is therefore never
//! empty, even for assets added upstream after this table was written.

mod connext;

use std::collections::HashMap;

/// Exponent used when a `(domain, asset)` pair has no decimals entry.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Read-only identifier → name / decimals mappings.
#[derive(Clone, Debug, Default)]
pub struct LookupTables {
    domains: HashMap<String, String>,
    assets: HashMap<String, String>,
    decimals: HashMap<(String, String), u32>,
}

impl LookupTables {
    /// Creates an empty table set. Every lookup falls back.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in tables for the Connext mainnet and testnet deployments.
    pub fn connext() -> Self {
        connext::tables()
    }

    /// Adds a display name for a chain domain.
    pub fn with_domain(mut self, domain: impl Into<String>, name: impl Into<String>) -> Self {
        self.domains.insert(domain.into(), name.into());
        self
    }

    /// Adds a display symbol for an asset address.
    pub fn with_asset(mut self, asset: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.assets
            .insert(asset.into().to_ascii_lowercase(), symbol.into());
        self
    }

    /// Records the decimal exponent of `asset` on `domain`.
    pub fn with_decimals(
        mut self,
        domain: impl Into<String>,
        asset: impl Into<String>,
        decimals: u32,
    ) -> Self {
        self.decimals
            .insert((domain.into(), asset.into().to_ascii_lowercase()), decimals);
        self
    }

    /// Display name for `domain`, or `domain` itself when unknown.
    pub fn domain_name<'a>(&'a self, domain: &'a str) -> &'a str {
        self.domains.get(domain).map(String::as_str).unwrap_or(domain)
    }

    /// Display symbol for `asset`, or `asset` itself when unknown.
    ///
    /// Addresses are matched case-insensitively; the fallback returns the
    /// identifier exactly as given.
    pub fn asset_symbol<'a>(&'a self, asset: &'a str) -> &'a str {
        self.assets
            .get(&asset.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(asset)
    }

    /// Decimal exponent of `asset` on `domain`, defaulting to
    /// [`DEFAULT_DECIMALS`].
    pub fn decimals_of(&self, domain: &str, asset: &str) -> u32 {
        self.decimals
            .get(&(domain.to_string(), asset.to_ascii_lowercase()))
            .copied()
            .unwrap_or(DEFAULT_DECIMALS)
    }

    /// Converts a raw on-chain amount into token units.
    pub fn normalize(&self, domain: &str, asset: &str, raw: f64) -> f64 {
        raw / 10f64.powi(self.decimals_of(domain, asset) as i32)
    }
}
