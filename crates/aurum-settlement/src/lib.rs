//! Aurum Settlement - the buy/sell trade state machine
//!
//! Composes idempotency resolution, price snapshots, fee calculation,
//! balance validation and the ledger posting engine into one atomic
//! settlement:
//!
//! ```text
//! VALIDATE_INPUT -> CHECK_IDEMPOTENCY -> LOAD_ACCOUNTS -> SNAPSHOT_PRICE
//!   -> CHECK_SLIPPAGE -> COMPUTE_FEE -> CHECK_BALANCE -> POST_JOURNAL
//!   -> RETURN_RECEIPT
//! ```
//!
//! Every failure up to and including CHECK_BALANCE happens before any
//! mutation; POST_JOURNAL either fully commits or fully rolls back. There is
//! no partial-success state.

pub mod config;
pub mod engine;
pub mod error;
pub mod receipt;

pub use config::{SettlementConfig, SymbolSpec};
pub use engine::{SettlementEngine, TradeRequest};
pub use error::{ErrorResponse, SettlementError, SettlementResult};
pub use receipt::{SettlementOutcome, TradeReceipt, RECEIPT_VERSION};
