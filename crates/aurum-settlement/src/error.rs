//! Settlement error taxonomy
//!
//! Each variant carries a stable `code` discriminator and an HTTP status for
//! the (external) transport layer. `Persistence` is deliberately opaque: the
//! underlying storage failure is logged server-side and never shown to the
//! caller, and `InsufficientBalance` never carries balance figures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use aurum_ledger::LedgerError;
use aurum_oracle::OracleError;

pub type SettlementResult<T> = Result<T, SettlementError>;

#[derive(Debug, Error)]
pub enum SettlementError {
    /// Malformed input; retrying the same request is useless.
    #[error("validation error: {0}")]
    Validation(String),

    /// Idempotency key reused with a different payload; the caller must
    /// generate a new key.
    #[error("idempotency key reused with a different payload")]
    IdempotencyConflict,

    /// Price moved beyond the allowed tolerance; the caller may retry with
    /// a fresh quote.
    #[error("price moved beyond the allowed tolerance")]
    SlippageExceeded,

    /// The caller must fund the account.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Upstream price oracle is down; safe to retry later.
    #[error("price feed unavailable")]
    PriceUnavailable,

    /// Missing account; a provisioning issue, not a user error.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected storage failure, surfaced generically.
    #[error("internal error")]
    Persistence,
}

impl SettlementError {
    /// Stable discriminator carried on error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            Self::SlippageExceeded => "SLIPPAGE_EXCEEDED",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::PriceUnavailable => "SERVICE_UNAVAILABLE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Persistence => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the transport layer.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InsufficientBalance => 400,
            Self::IdempotencyConflict | Self::SlippageExceeded => 409,
            Self::NotFound(_) => 404,
            Self::PriceUnavailable => 503,
            Self::Persistence => 500,
        }
    }
}

impl From<LedgerError> for SettlementError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound { account_id } => {
                Self::NotFound(format!("account {account_id}"))
            }
            LedgerError::InsufficientBalance { .. } => Self::InsufficientBalance,
            // Duplicate references are resolved by the engine before this
            // conversion; one arriving here is a bug worth the log line.
            LedgerError::DuplicateReference { ref reference } => {
                tracing::error!(reference, "unresolved duplicate reference");
                Self::Persistence
            }
            LedgerError::Storage(ref detail) => {
                tracing::error!(detail, "ledger storage failure");
                Self::Persistence
            }
        }
    }
}

impl From<OracleError> for SettlementError {
    fn from(err: OracleError) -> Self {
        tracing::warn!(error = %err, "price oracle failure");
        Self::PriceUnavailable
    }
}

/// Error body handed to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub msg: String,
}

impl From<&SettlementError> for ErrorResponse {
    fn from(err: &SettlementError) -> Self {
        Self {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}
