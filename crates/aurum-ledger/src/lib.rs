//! Aurum Ledger - double-entry journal and balance core
//!
//! The ledger is:
//! - Double-entry (per asset, every credit has a matching debit)
//! - Immutable (journals are append-only, corrections are new journals)
//! - Idempotent (the journal reference is a storage-enforced unique key)
//! - Materialized (balances are the running total of all committed entries)
//!
//! # Invariants
//!
//! 1. No negative balances, ever
//! 2. Balances are written only by the posting engine
//! 3. At most one journal exists for a given reference
//! 4. A journal commits atomically with all its balance deltas, or not at all

pub mod balance;
pub mod idempotency;
pub mod memory;
pub mod posting;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use aurum_types::Asset;

pub use balance::check_sufficient;
pub use idempotency::{reference_is_wellformed, resolve, Resolution, TradeIntent};
pub use memory::MemoryLedger;
pub use posting::PostingEngine;
pub use store::{AccountDirectory, LedgerStore};

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("account not found: {account_id}")]
    AccountNotFound { account_id: Uuid },

    #[error("insufficient {asset} balance on account {account_id}")]
    InsufficientBalance { account_id: Uuid, asset: Asset },

    #[error("journal reference already exists: {reference}")]
    DuplicateReference { reference: String },

    #[error("storage error: {0}")]
    Storage(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
