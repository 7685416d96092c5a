//! Built-in Connext domain and asset tables.

use super::LookupTables;

/// `(domain id, display name)`.
const DOMAINS: &[(&str, &str)] = &[
    // mainnet
    ("6648936", "Ethereum"),
    ("1869640809", "Optimism"),
    ("1886350457", "Polygon"),
    ("1634886255", "Arbitrum-One"),
    ("6450786", "BSC"),
    ("6778479", "Gnosis"),
    // testnet
    ("1735353714", "Goerli"),
    ("1735356532", "Optimism Goerli"),
    ("9991", "Mumbai"),
    ("421613", "Arbitrum Goerli"),
];

/// `(domain id, local asset address, symbol, decimals)`.
const ASSETS: &[(&str, &str, &str, u32)] = &[
    // mainnet
    ("6648936", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "USDC", 6),
    ("6648936", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "WETH", 18),
    ("1869640809", "0x67e51f46e8e14d4e4cab9df48c59ad8f512486dd", "nextUSDC", 6),
    ("1869640809", "0xbad5b3c68f855eaece68203312fd88ad3d365e50", "nextWETH", 18),
    ("1886350457", "0xf96c6d2537e1af1a9503852eb2a4af264272a5b6", "nextUSDC", 6),
    ("1886350457", "0x4b8bac8dd1caa52e32c07755c17efaded6a0bbd0", "nextWETH", 18),
    ("1634886255", "0x8c556cf37faa0eedac7ae665f1bb0fbd4b2eae36", "nextUSDC", 6),
    ("1634886255", "0x2983bf5c334743aa6657ad70a55041d720d225db", "nextWETH", 18),
    // The token itself has 18 decimals but the indexer reports it with 6.
    ("6450786", "0x5e7d83da751f4c9694b13af351b30ac108f32c38", "nextUSDC", 6),
    ("6450786", "0xa9cb51c666d2af451d87442be50747b31bb7d805", "nextWETH", 18),
    ("6778479", "0x44cf74238d840a5febb0eaa089d05b763b73fab8", "nextUSDC", 6),
    ("6778479", "0x538e2ddbfdf476d24ccb1477a518a82c9ea81326", "nextWETH", 18),
    // testnet
    ("1735353714", "0x7ea6ea49b0b0ae9c5db7907d139d9cd3439862a1", "TEST", 18),
    ("1735353714", "0xb4fbf271143f4fbf7b91a5ded31805e42b2208d6", "WETH", 18),
    ("1735356532", "0x68db1c8d85c09d546097c65ec7dcbff4d6497cbf", "TEST", 18),
    ("1735356532", "0x39b061b7e41de8b721f9aeceb6b3f17ecb7ba63e", "nextWETH", 18),
    ("9991", "0xedb95d8037f769b72aaab41deec92903a98c9e16", "TEST", 18),
    ("9991", "0x1e5341e4b7ed5d0680d9066aac0396f0b1bd1e69", "nextWETH", 18),
    ("421613", "0xdc805eaaabd6f68904ca706c221c72f8a8a68f9f", "TEST", 18),
    ("421613", "0x1346786e6a5e07b90184a1ba58e55444b99dc4a2", "nextWETH", 18),
];

pub(super) fn tables() -> LookupTables {
    let tables = DOMAINS
        .iter()
        .fold(LookupTables::new(), |t, (domain, name)| {
            t.with_domain(*domain, *name)
        });

    ASSETS
        .iter()
        .fold(tables, |t, (domain, asset, symbol, decimals)| {
            t.with_asset(*asset, *symbol)
                .with_decimals(*domain, *asset, *decimals)
        })
}
