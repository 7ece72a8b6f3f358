//! Client-facing trade receipts

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aurum_types::{Journal, Side};

/// Receipt schema version.
pub const RECEIPT_VERSION: &str = "v1";

/// The receipt returned for a settled (or replayed) trade.
///
/// A replayed request rebuilds this from the stored journal, so the fields
/// are identical to the original successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub symbol: String,
    /// Rendered with exactly 8 fractional digits on the wire.
    #[serde(with = "aurum_types::decimal::amount8_serde")]
    pub qty: Decimal,
    pub price: Decimal,
    #[serde(with = "aurum_types::decimal::amount8_serde")]
    pub fee: Decimal,
    pub ts: DateTime<Utc>,
    pub price_source: String,
    pub spread_bps: Decimal,
    pub request_id: String,
    pub journal_id: Uuid,
    pub side: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic_symbol: Option<String>,
    pub receipt_v: String,
}

impl TradeReceipt {
    pub fn from_journal(journal: &Journal) -> Self {
        let fill = journal.metadata.fill();
        Self {
            symbol: fill.symbol.clone(),
            qty: fill.qty,
            price: fill.price,
            fee: fill.fee,
            ts: journal.ts,
            price_source: fill.price_source.clone(),
            spread_bps: fill.spread_bps,
            request_id: journal.reference.clone(),
            journal_id: journal.id,
            side: journal.metadata.side(),
            synthetic_symbol: fill.synthetic_symbol.clone(),
            receipt_v: fill.receipt_v.clone(),
        }
    }
}

/// A receipt plus whether it came from a replay.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub receipt: TradeReceipt,
    pub replayed: bool,
}

impl SettlementOutcome {
    /// 200 for an idempotent replay, 201 for a first commit.
    pub fn http_status(&self) -> u16 {
        if self.replayed {
            200
        } else {
            201
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn receipt_amounts_serialize_with_eight_fractional_digits() {
        let receipt = TradeReceipt {
            symbol: "XAU-s".to_string(),
            qty: dec!(0.1),
            price: dec!(2150),
            fee: dec!(0.0005),
            ts: Utc::now(),
            price_source: "test".to_string(),
            spread_bps: Decimal::ZERO,
            request_id: "req-0001-aaaa".to_string(),
            journal_id: Uuid::new_v4(),
            side: Side::Buy,
            synthetic_symbol: Some("XAU-s".to_string()),
            receipt_v: RECEIPT_VERSION.to_string(),
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["qty"], "0.10000000");
        assert_eq!(json["fee"], "0.00050000");

        let back: TradeReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back, receipt);
    }
}
