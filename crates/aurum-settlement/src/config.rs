//! Settlement configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurum_types::Asset;

/// A tradable symbol and how it settles in the ledger.
///
/// Synthetic assets are backed 1:1 by a custodied asset; every journal leg
/// is denominated in the backing asset, and the trading-account balance in
/// that asset *is* the synthetic position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    pub synthetic_asset: String,
    pub backing_asset: Asset,
    /// Pair requested from the price oracle.
    pub oracle_pair: String,
}

/// Platform settlement configuration, injected at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Fee rate in basis points.
    pub fee_rate_bps: u32,
    /// Minimum fee floor.
    pub min_fee: Decimal,
    /// Account receiving trade fees. An explicit id, never resolved by
    /// lookup at request time.
    pub fee_sink_account_id: Uuid,
    /// Slippage tolerance applied when the caller supplies none.
    pub default_slippage_tolerance: Decimal,
    /// Supported symbols.
    pub symbols: Vec<SymbolSpec>,
}

impl SettlementConfig {
    pub fn new(fee_sink_account_id: Uuid) -> Self {
        Self {
            fee_rate_bps: 50,
            min_fee: Decimal::ZERO,
            fee_sink_account_id,
            default_slippage_tolerance: dec!(0.005),
            symbols: vec![
                SymbolSpec {
                    symbol: "XAU-s".to_string(),
                    synthetic_asset: "XAU-s".to_string(),
                    backing_asset: Asset::paxg(),
                    oracle_pair: "PAXGUSD".to_string(),
                },
                SymbolSpec {
                    symbol: "XAG-s".to_string(),
                    synthetic_asset: "XAG-s".to_string(),
                    backing_asset: Asset::new("KAG"),
                    oracle_pair: "KAGUSD".to_string(),
                },
            ],
        }
    }

    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new(parse_fee_sink(std::env::var("FEE_SINK_ACCOUNT_ID").ok()));
        if let Some(bps) = std::env::var("FEE_RATE_BPS").ok().and_then(|s| s.parse().ok()) {
            config.fee_rate_bps = bps;
        }
        if let Some(floor) = std::env::var("MIN_FEE").ok().and_then(|s| s.parse().ok()) {
            config.min_fee = floor;
        }
        config
    }

    /// Resolve a supported symbol.
    pub fn symbol(&self, symbol: &str) -> Option<&SymbolSpec> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }
}

fn parse_fee_sink(raw: Option<String>) -> Uuid {
    raw.expect("FEE_SINK_ACCOUNT_ID must be set")
        .parse()
        .expect("FEE_SINK_ACCOUNT_ID must be a valid UUID")
}
