//! Aurum Fee Engine
//!
//! Pure basis-point fee calculation with a configurable minimum floor:
//!
//! ```text
//! fee = max(truncate8(qty * rate_bps / 10_000), min_fee)
//! ```
//!
//! Deterministic, no I/O. Quantity validation happens upstream, so fees are
//! always computed on a strictly positive quantity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use aurum_types::truncate8;

/// Fee schedule applied to every trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee rate in basis points (50 = 0.50%).
    pub rate_bps: u32,
    /// Minimum fee floor, may be zero.
    pub min_fee: Decimal,
}

impl FeeSchedule {
    pub fn new(rate_bps: u32, min_fee: Decimal) -> Self {
        Self {
            rate_bps,
            min_fee: truncate8(min_fee),
        }
    }

    /// Fee owed on a strictly positive quantity.
    pub fn fee_for(&self, qty: Decimal) -> Decimal {
        let fee = truncate8(qty * Decimal::from(self.rate_bps) / dec!(10_000));
        fee.max(self.min_fee)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::new(50, Decimal::ZERO)
    }
}
