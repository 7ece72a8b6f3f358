//! Ledger posting engine
//!
//! The single component allowed to write balances. Takes a balanced draft,
//! stamps identity and time, and hands it to the store for an atomic commit.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use aurum_types::{Journal, JournalDraft};

use crate::{LedgerResult, LedgerStore};

/// Commits balanced journal drafts.
#[derive(Clone)]
pub struct PostingEngine {
    store: Arc<dyn LedgerStore>,
}

impl PostingEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Commit a draft atomically.
    ///
    /// Panics if the draft does not balance: an unbalanced draft is a bug in
    /// the caller, not bad user input, and must never reach storage.
    ///
    /// A `DuplicateReference` error signals the caller to re-resolve
    /// idempotency; it is not a generic persistence failure.
    pub async fn post(&self, draft: JournalDraft) -> LedgerResult<Journal> {
        assert!(
            draft.is_balanced(),
            "unbalanced journal draft for reference {}",
            draft.reference
        );

        let journal = Journal {
            id: Uuid::new_v4(),
            reference: draft.reference,
            description: draft.description,
            metadata: draft.metadata,
            entries: draft.entries,
            ts: Utc::now(),
        };

        let committed = self.store.commit(journal).await?;
        info!(
            journal_id = %committed.id,
            reference = %committed.reference,
            legs = committed.entries.len(),
            "journal committed"
        );
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;
    use aurum_types::{Asset, FillDetails, JournalEntry, Side, TradeMetadata};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn fill(qty: Decimal) -> FillDetails {
        FillDetails {
            symbol: "XAU-s".to_string(),
            synthetic_symbol: None,
            qty,
            price: dec!(2150),
            fee: Decimal::ZERO,
            spread_bps: Decimal::ZERO,
            price_source: "test".to_string(),
            receipt_v: "v1".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_balanced_draft() {
        let store = Arc::new(MemoryLedger::new());
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        store.seed_balance(from, Asset::paxg(), dec!(1)).await;

        let engine = PostingEngine::new(store.clone());
        let journal = engine
            .post(JournalDraft {
                reference: "ref-00000001".to_string(),
                description: "buy 0.1 XAU-s".to_string(),
                metadata: TradeMetadata::new(Side::Buy, fill(dec!(0.1))),
                entries: vec![
                    JournalEntry::credit(from, Asset::paxg(), dec!(0.1)),
                    JournalEntry::debit(to, Asset::paxg(), dec!(0.1)),
                ],
            })
            .await
            .unwrap();

        assert_eq!(journal.reference, "ref-00000001");
        assert_eq!(store.balance(to, &Asset::paxg()).await.unwrap(), dec!(0.1));
    }

    #[tokio::test]
    #[should_panic(expected = "unbalanced journal draft")]
    async fn unbalanced_draft_panics() {
        let engine = PostingEngine::new(Arc::new(MemoryLedger::new()));
        let _ = engine
            .post(JournalDraft {
                reference: "ref-00000001".to_string(),
                description: "bad".to_string(),
                metadata: TradeMetadata::new(Side::Buy, fill(dec!(0.1))),
                entries: vec![JournalEntry::credit(
                    Uuid::new_v4(),
                    Asset::paxg(),
                    dec!(0.1),
                )],
            })
            .await;
    }
}
