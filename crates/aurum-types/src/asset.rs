//! Ledger assets

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ledger asset symbol, e.g. `PAXG` for the custodied gold token.
///
/// Synthetic assets (e.g. `XAU-s`) are backed 1:1 by a custodied asset and
/// settle in the backing asset's ledger denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset(pub String);

impl Asset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// PAX Gold, the default custody asset backing synthetic gold.
    pub fn paxg() -> Self {
        Self("PAXG".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Asset {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}
