//! Aurum Price Oracle Client
//!
//! The settlement core consumes prices as opaque point-in-time snapshots; it
//! never computes prices itself. Two snapshots are taken per trade (previous
//! and execution) to support slippage checks.
//!
//! External calls go through [`Guarded`], a three-state circuit breaker
//! (CLOSED / OPEN / HALF_OPEN) reusable by any dependency this core consults.

pub mod breaker;
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker, Guarded};
pub use http::HttpPriceOracle;

/// Oracle failures. All of them map to `PriceUnavailable` at the settlement
/// boundary; the distinction matters only for logs and the breaker.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("price oracle unavailable: {0}")]
    Unavailable(String),

    #[error("price oracle returned an unusable response: {0}")]
    BadResponse(String),

    #[error("price oracle circuit is open")]
    CircuitOpen,
}

pub type OracleResult<T> = Result<T, OracleError>;

/// A point-in-time price observation for an asset pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub pair: String,
    /// USD price of one unit of the base asset.
    pub usd: Decimal,
    pub ts: DateTime<Utc>,
    /// Where the price came from, echoed on receipts.
    pub source: String,
}

/// A price oracle exposing point-in-time ticker snapshots.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn ticker(&self, pair: &str) -> OracleResult<TickerSnapshot>;
}
