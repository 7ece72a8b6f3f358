//! Fixed-point money helpers
//!
//! All money quantities in the core (qty, fees, balances) are `rust_decimal`
//! values truncated to 8 fractional digits before they are compared or
//! persisted. Truncation goes toward zero, never rounds, and is idempotent,
//! so chained operations cannot accumulate drift.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Fractional digits carried by every money amount.
pub const MONEY_SCALE: u32 = 8;

/// Errors from parsing money quantities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecimalError {
    #[error("malformed decimal literal: {0}")]
    Malformed(String),

    #[error("quantity must be greater than zero")]
    NotPositive,
}

/// Truncate toward zero at 8 fractional digits.
pub fn truncate8(value: Decimal) -> Decimal {
    value.trunc_with_scale(MONEY_SCALE)
}

/// Render a money amount with exactly 8 fractional digits.
pub fn format_amount8(value: Decimal) -> String {
    format!("{:.8}", truncate8(value))
}

/// Parse a client-supplied quantity string.
///
/// Accepts exactly `[0-9]+(.[0-9]+)?` - no sign, no exponent, no leading or
/// trailing dot - and requires the truncated value to be strictly positive.
pub fn parse_qty(raw: &str) -> Result<Decimal, DecimalError> {
    if !is_plain_decimal(raw) {
        return Err(DecimalError::Malformed(raw.to_string()));
    }
    let value =
        Decimal::from_str(raw).map_err(|_| DecimalError::Malformed(raw.to_string()))?;
    let value = truncate8(value);
    if value <= Decimal::ZERO {
        return Err(DecimalError::NotPositive);
    }
    Ok(value)
}

/// Serde adapter for money fields on client-facing payloads: serializes
/// through [`format_amount8`] so every amount carries exactly 8 fractional
/// digits on the wire. Use with `#[serde(with = "...")]`.
pub mod amount8_serde {
    use super::{format_amount8, truncate8};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_amount8(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Decimal::from_str(&raw)
            .map(truncate8)
            .map_err(serde::de::Error::custom)
    }
}

fn is_plain_decimal(raw: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match raw.split_once('.') {
        None => all_digits(raw),
        Some((int, frac)) => all_digits(int) && all_digits(frac),
    }
}
