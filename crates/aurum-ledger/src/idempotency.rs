//! Idempotency resolution
//!
//! The reference lookup is the sole deduplication layer for retried trade
//! requests: it runs before any balance mutation, and a replayed request
//! must receive the receipt of the original successful call, not a
//! recomputation.

use rust_decimal::Decimal;

use aurum_types::{Journal, Side, MIN_REFERENCE_LEN};

use crate::{LedgerResult, LedgerStore};

/// The fields of a candidate request that must match a stored journal for
/// the request to count as a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub side: Side,
    pub symbol: String,
    pub qty: Decimal,
}

/// Outcome of resolving a reference against the journal history.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No journal exists for this reference; the trade may proceed.
    Proceed,
    /// An identical request already committed; replay its journal verbatim.
    Replay(Journal),
    /// The reference was reused with a divergent payload; reject with no
    /// side effects.
    Conflict,
}

/// References shorter than 8 characters are malformed and rejected before
/// any lookup.
pub fn reference_is_wellformed(reference: &str) -> bool {
    reference.len() >= MIN_REFERENCE_LEN
}

/// Resolve a client reference against any previously committed journal.
pub async fn resolve(
    store: &dyn LedgerStore,
    reference: &str,
    intent: &TradeIntent,
) -> LedgerResult<Resolution> {
    let existing = match store.find_journal_by_reference(reference).await? {
        Some(journal) => journal,
        None => return Ok(Resolution::Proceed),
    };

    let fill = existing.metadata.fill();
    let matches = existing.metadata.side() == intent.side
        && fill.symbol == intent.symbol
        && fill.qty == intent.qty;

    if matches {
        Ok(Resolution::Replay(existing))
    } else {
        Ok(Resolution::Conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;
    use aurum_types::{
        Asset, FillDetails, Journal, JournalEntry, TradeMetadata,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn committed_buy(store_qty: Decimal) -> (MemoryLedger, Journal) {
        let ledger = MemoryLedger::new();
        let funding = Uuid::new_v4();
        let trading = Uuid::new_v4();
        let journal = Journal {
            id: Uuid::new_v4(),
            reference: "req-12345678".to_string(),
            description: "buy".to_string(),
            metadata: TradeMetadata::Buy(FillDetails {
                symbol: "XAU-s".to_string(),
                synthetic_symbol: Some("XAU-s".to_string()),
                qty: store_qty,
                price: dec!(2150),
                fee: Decimal::ZERO,
                spread_bps: Decimal::ZERO,
                price_source: "test".to_string(),
                receipt_v: "v1".to_string(),
            }),
            entries: vec![
                JournalEntry::credit(funding, Asset::paxg(), store_qty),
                JournalEntry::debit(trading, Asset::paxg(), store_qty),
            ],
            ts: Utc::now(),
        };
        (ledger, journal)
    }

    #[tokio::test]
    async fn unseen_reference_proceeds() {
        let (ledger, _) = committed_buy(dec!(0.1));
        let intent = TradeIntent {
            side: Side::Buy,
            symbol: "XAU-s".to_string(),
            qty: dec!(0.1),
        };
        let resolution = resolve(&ledger, "req-12345678", &intent).await.unwrap();
        assert!(matches!(resolution, Resolution::Proceed));
    }

    #[tokio::test]
    async fn identical_payload_replays() {
        let (ledger, journal) = committed_buy(dec!(0.1));
        ledger.seed_balance(journal.entries[0].account_id, Asset::paxg(), dec!(1)).await;
        let committed = ledger.commit(journal).await.unwrap();

        let intent = TradeIntent {
            side: Side::Buy,
            symbol: "XAU-s".to_string(),
            qty: dec!(0.1),
        };
        match resolve(&ledger, "req-12345678", &intent).await.unwrap() {
            Resolution::Replay(replayed) => {
                assert_eq!(replayed.id, committed.id);
                assert_eq!(replayed.ts, committed.ts);
            }
            other => panic!("expected replay, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn divergent_payload_conflicts() {
        let (ledger, journal) = committed_buy(dec!(0.1));
        ledger.seed_balance(journal.entries[0].account_id, Asset::paxg(), dec!(1)).await;
        ledger.commit(journal).await.unwrap();

        let intent = TradeIntent {
            side: Side::Buy,
            symbol: "XAU-s".to_string(),
            qty: dec!(0.2),
        };
        let resolution = resolve(&ledger, "req-12345678", &intent).await.unwrap();
        assert!(matches!(resolution, Resolution::Conflict));
    }

    #[test]
    fn short_references_are_malformed() {
        assert!(!reference_is_wellformed("short"));
        assert!(!reference_is_wellformed(""));
        assert!(reference_is_wellformed("12345678"));
    }
}
