//! Aurum foundation types
//!
//! Shared vocabulary for the precious-metals ledger core:
//!
//! - Fixed-point money helpers (scale 8, truncation not rounding)
//! - Assets, accounts, trade sides
//! - Journals and their entries (the double-entry model)
//!
//! # Invariants
//!
//! 1. Money never passes through binary floats
//! 2. Every journal balances per asset (credits == debits)
//! 3. Journals are immutable once committed

pub mod account;
pub mod asset;
pub mod decimal;
pub mod journal;

pub use account::{Account, AccountType};
pub use asset::Asset;
pub use decimal::{format_amount8, parse_qty, truncate8, DecimalError, MONEY_SCALE};
pub use journal::{
    Direction, FillDetails, Journal, JournalDraft, JournalEntry, Side, TradeMetadata,
    MIN_REFERENCE_LEN,
};
