//! Storage seams for the ledger
//!
//! The store is the single source of truth for balances; there is no
//! in-process shared mutable state. Implementations must make `commit`
//! atomic and serialized per `(account, asset)`: the balance read and the
//! subsequent write happen under a row-level lock (or an equivalent
//! serializing primitive), and the journal reference is enforced unique at
//! the storage level, not just in application code.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use aurum_types::{Account, Asset, Journal};

use crate::LedgerResult;

/// Persistence contract for journals and materialized balances.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Look up a committed journal by its idempotency reference.
    async fn find_journal_by_reference(&self, reference: &str) -> LedgerResult<Option<Journal>>;

    /// Current materialized balance for `(account, asset)`, zero if the row
    /// does not exist yet.
    async fn balance(&self, account_id: Uuid, asset: &Asset) -> LedgerResult<Decimal>;

    /// Atomically apply all of the journal's balance deltas and append the
    /// journal row.
    ///
    /// Fails with `InsufficientBalance` if any credit would drive a balance
    /// negative, and with `DuplicateReference` if the reference already
    /// exists; in both cases nothing is written.
    async fn commit(&self, journal: Journal) -> LedgerResult<Journal>;

    /// Most recently committed journals, newest first.
    async fn recent_journals(&self, limit: usize) -> LedgerResult<Vec<Journal>>;
}

/// Account lookup consumed from the provisioning layer.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_accounts_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Account>>;
}
