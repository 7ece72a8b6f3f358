//! In-memory ledger store
//!
//! Backs tests and local development. A single mutex over the whole state
//! serializes commits, which gives the same read-then-write atomicity the
//! PostgreSQL store gets from row locks.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use aurum_types::{truncate8, Account, Asset, Direction, Journal};

use crate::{AccountDirectory, LedgerError, LedgerResult, LedgerStore};

#[derive(Default)]
struct MemoryState {
    balances: HashMap<(Uuid, Asset), Decimal>,
    journals: Vec<Journal>,
    by_reference: HashMap<String, usize>,
    accounts: HashMap<Uuid, Vec<Account>>,
}

/// In-memory ledger store and account directory.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account under its owning user.
    pub async fn add_account(&self, account: Account) {
        let mut state = self.state.lock().await;
        state
            .accounts
            .entry(account.user_id)
            .or_default()
            .push(account);
    }

    /// Set a starting balance directly, bypassing the journal. Bootstrap and
    /// test seeding only.
    pub async fn seed_balance(&self, account_id: Uuid, asset: Asset, amount: Decimal) {
        let mut state = self.state.lock().await;
        state
            .balances
            .insert((account_id, asset), truncate8(amount));
    }

    pub async fn journal_count(&self) -> usize {
        self.state.lock().await.journals.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn find_journal_by_reference(&self, reference: &str) -> LedgerResult<Option<Journal>> {
        let state = self.state.lock().await;
        Ok(state
            .by_reference
            .get(reference)
            .map(|&idx| state.journals[idx].clone()))
    }

    async fn balance(&self, account_id: Uuid, asset: &Asset) -> LedgerResult<Decimal> {
        let state = self.state.lock().await;
        Ok(state
            .balances
            .get(&(account_id, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn commit(&self, journal: Journal) -> LedgerResult<Journal> {
        let mut state = self.state.lock().await;

        if state.by_reference.contains_key(&journal.reference) {
            return Err(LedgerError::DuplicateReference {
                reference: journal.reference.clone(),
            });
        }

        // Stage all deltas first so a failing leg leaves nothing applied.
        let mut staged: HashMap<(Uuid, Asset), Decimal> = HashMap::new();
        for entry in &journal.entries {
            let key = (entry.account_id, entry.asset.clone());
            let current = staged
                .get(&key)
                .copied()
                .or_else(|| state.balances.get(&key).copied())
                .unwrap_or(Decimal::ZERO);
            let next = match entry.direction {
                Direction::Debit => current + entry.amount,
                Direction::Credit => current - entry.amount,
            };
            if next < Decimal::ZERO {
                return Err(LedgerError::InsufficientBalance {
                    account_id: entry.account_id,
                    asset: entry.asset.clone(),
                });
            }
            staged.insert(key, truncate8(next));
        }

        for (key, next) in staged {
            state.balances.insert(key, next);
        }
        let idx = state.journals.len();
        state.by_reference.insert(journal.reference.clone(), idx);
        state.journals.push(journal.clone());
        Ok(journal)
    }

    async fn recent_journals(&self, limit: usize) -> LedgerResult<Vec<Journal>> {
        let state = self.state.lock().await;
        Ok(state.journals.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl AccountDirectory for MemoryLedger {
    async fn find_accounts_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurum_types::{FillDetails, JournalEntry, TradeMetadata};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn transfer_journal(reference: &str, from: Uuid, to: Uuid, amount: Decimal) -> Journal {
        Journal {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            description: "transfer".to_string(),
            metadata: TradeMetadata::Buy(FillDetails {
                symbol: "XAU-s".to_string(),
                synthetic_symbol: None,
                qty: amount,
                price: dec!(2150),
                fee: Decimal::ZERO,
                spread_bps: Decimal::ZERO,
                price_source: "test".to_string(),
                receipt_v: "v1".to_string(),
            }),
            entries: vec![
                JournalEntry::credit(from, Asset::paxg(), amount),
                JournalEntry::debit(to, Asset::paxg(), amount),
            ],
            ts: Utc::now(),
        }
    }

    #[tokio::test]
    async fn commit_updates_materialized_balances() {
        let ledger = MemoryLedger::new();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        ledger.seed_balance(from, Asset::paxg(), dec!(1)).await;

        ledger
            .commit(transfer_journal("ref-00000001", from, to, dec!(0.4)))
            .await
            .unwrap();

        assert_eq!(ledger.balance(from, &Asset::paxg()).await.unwrap(), dec!(0.6));
        assert_eq!(ledger.balance(to, &Asset::paxg()).await.unwrap(), dec!(0.4));
    }

    #[tokio::test]
    async fn duplicate_reference_is_rejected_without_side_effects() {
        let ledger = MemoryLedger::new();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        ledger.seed_balance(from, Asset::paxg(), dec!(1)).await;

        ledger
            .commit(transfer_journal("ref-00000001", from, to, dec!(0.1)))
            .await
            .unwrap();
        let err = ledger
            .commit(transfer_journal("ref-00000001", from, to, dec!(0.1)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateReference { .. }));
        assert_eq!(ledger.balance(from, &Asset::paxg()).await.unwrap(), dec!(0.9));
        assert_eq!(ledger.journal_count().await, 1);
    }

    #[tokio::test]
    async fn overdraft_rolls_back_entirely() {
        let ledger = MemoryLedger::new();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        ledger.seed_balance(from, Asset::paxg(), dec!(0.05)).await;

        let err = ledger
            .commit(transfer_journal("ref-00000001", from, to, dec!(0.1)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        // Nothing applied: not even the receiving leg
        assert_eq!(ledger.balance(from, &Asset::paxg()).await.unwrap(), dec!(0.05));
        assert_eq!(ledger.balance(to, &Asset::paxg()).await.unwrap(), Decimal::ZERO);
        assert_eq!(ledger.journal_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_balance_is_zero() {
        let ledger = MemoryLedger::new();
        assert_eq!(
            ledger.balance(Uuid::new_v4(), &Asset::paxg()).await.unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn recent_journals_newest_first() {
        let ledger = MemoryLedger::new();
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        ledger.seed_balance(from, Asset::paxg(), dec!(1)).await;

        ledger
            .commit(transfer_journal("ref-00000001", from, to, dec!(0.1)))
            .await
            .unwrap();
        ledger
            .commit(transfer_journal("ref-00000002", from, to, dec!(0.2)))
            .await
            .unwrap();

        let recent = ledger.recent_journals(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].reference, "ref-00000002");
    }
}
