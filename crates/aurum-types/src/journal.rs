//! Journals - immutable, balanced units of account movement
//!
//! A journal is created exactly once, at commit time, inside one atomic
//! transaction that also updates all affected balances. Journals are never
//! mutated or deleted; corrections are new journals, not edits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::asset::Asset;

/// Minimum length of a client-supplied idempotency reference.
pub const MIN_REFERENCE_LEN: usize = 8;

/// Trade direction from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// One leg of a movement.
///
/// CREDIT decreases the account's balance (funds leaving), DEBIT increases it
/// (funds arriving).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

/// A single credit or debit leg within a journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub account_id: Uuid,
    pub asset: Asset,
    pub direction: Direction,
    /// Strictly positive, scale 8.
    pub amount: Decimal,
}

impl JournalEntry {
    pub fn credit(account_id: Uuid, asset: Asset, amount: Decimal) -> Self {
        Self {
            account_id,
            asset,
            direction: Direction::Credit,
            amount,
        }
    }

    pub fn debit(account_id: Uuid, asset: Asset, amount: Decimal) -> Self {
        Self {
            account_id,
            asset,
            direction: Direction::Debit,
            amount,
        }
    }
}

/// Execution details shared by both trade sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillDetails {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic_symbol: Option<String>,
    pub qty: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub spread_bps: Decimal,
    pub price_source: String,
    pub receipt_v: String,
}

/// Journal metadata, tagged by trade side.
///
/// Carries exactly the fields needed for idempotency comparison and receipt
/// replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "lowercase")]
pub enum TradeMetadata {
    Buy(FillDetails),
    Sell(FillDetails),
}

impl TradeMetadata {
    pub fn new(side: Side, fill: FillDetails) -> Self {
        match side {
            Side::Buy => TradeMetadata::Buy(fill),
            Side::Sell => TradeMetadata::Sell(fill),
        }
    }

    pub fn side(&self) -> Side {
        match self {
            TradeMetadata::Buy(_) => Side::Buy,
            TradeMetadata::Sell(_) => Side::Sell,
        }
    }

    pub fn fill(&self) -> &FillDetails {
        match self {
            TradeMetadata::Buy(fill) | TradeMetadata::Sell(fill) => fill,
        }
    }
}

/// A journal awaiting commit. The posting engine assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct JournalDraft {
    /// Client-supplied idempotency key, globally unique.
    pub reference: String,
    pub description: String,
    pub metadata: TradeMetadata,
    pub entries: Vec<JournalEntry>,
}

impl JournalDraft {
    /// True when, for every asset the entries touch, the sum of CREDIT
    /// amounts equals the sum of DEBIT amounts and every amount is strictly
    /// positive. The ledger never creates or destroys value.
    pub fn is_balanced(&self) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let mut net: HashMap<&Asset, Decimal> = HashMap::new();
        for entry in &self.entries {
            if entry.amount <= Decimal::ZERO {
                return false;
            }
            let delta = match entry.direction {
                Direction::Credit => entry.amount,
                Direction::Debit => -entry.amount,
            };
            *net.entry(&entry.asset).or_insert(Decimal::ZERO) += delta;
        }
        net.values().all(|v| v.is_zero())
    }
}

/// An immutable, committed journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: Uuid,
    pub reference: String,
    pub description: String,
    pub metadata: TradeMetadata,
    pub entries: Vec<JournalEntry>,
    pub ts: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fill() -> FillDetails {
        FillDetails {
            symbol: "XAU-s".to_string(),
            synthetic_symbol: Some("XAU-s".to_string()),
            qty: dec!(0.1),
            price: dec!(2150),
            fee: dec!(0.0005),
            spread_bps: Decimal::ZERO,
            price_source: "test".to_string(),
            receipt_v: "v1".to_string(),
        }
    }

    #[test]
    fn balanced_three_leg_draft() {
        let funding = Uuid::new_v4();
        let trading = Uuid::new_v4();
        let sink = Uuid::new_v4();
        let draft = JournalDraft {
            reference: "ref-00001".to_string(),
            description: "buy 0.1 XAU-s".to_string(),
            metadata: TradeMetadata::Buy(fill()),
            entries: vec![
                JournalEntry::credit(funding, Asset::paxg(), dec!(0.1005)),
                JournalEntry::debit(trading, Asset::paxg(), dec!(0.1)),
                JournalEntry::debit(sink, Asset::paxg(), dec!(0.0005)),
            ],
        };
        assert!(draft.is_balanced());
    }

    #[test]
    fn unbalanced_draft_is_rejected() {
        let draft = JournalDraft {
            reference: "ref-00001".to_string(),
            description: "bad".to_string(),
            metadata: TradeMetadata::Buy(fill()),
            entries: vec![
                JournalEntry::credit(Uuid::new_v4(), Asset::paxg(), dec!(1)),
                JournalEntry::debit(Uuid::new_v4(), Asset::paxg(), dec!(0.9)),
            ],
        };
        assert!(!draft.is_balanced());
    }

    #[test]
    fn balance_is_tracked_per_asset() {
        // Credits and debits match in total but not per asset.
        let draft = JournalDraft {
            reference: "ref-00001".to_string(),
            description: "bad".to_string(),
            metadata: TradeMetadata::Buy(fill()),
            entries: vec![
                JournalEntry::credit(Uuid::new_v4(), Asset::paxg(), dec!(1)),
                JournalEntry::debit(Uuid::new_v4(), Asset::new("XAG"), dec!(1)),
            ],
        };
        assert!(!draft.is_balanced());
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let draft = JournalDraft {
            reference: "ref-00001".to_string(),
            description: "bad".to_string(),
            metadata: TradeMetadata::Buy(fill()),
            entries: vec![
                JournalEntry::credit(Uuid::new_v4(), Asset::paxg(), Decimal::ZERO),
                JournalEntry::debit(Uuid::new_v4(), Asset::paxg(), Decimal::ZERO),
            ],
        };
        assert!(!draft.is_balanced());
    }

    #[test]
    fn metadata_is_tagged_by_side() {
        let value = serde_json::to_value(TradeMetadata::Buy(fill())).unwrap();
        assert_eq!(value["side"], "buy");
        assert_eq!(value["symbol"], "XAU-s");

        let back: TradeMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back.side(), Side::Buy);
        assert_eq!(back.fill().qty, dec!(0.1));
    }
}
