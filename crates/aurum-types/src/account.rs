//! User ledger accounts

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The two per-user ledger accounts.
///
/// Funding holds spendable balance, trading holds position balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Funding,
    Trading,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Funding => "funding",
            AccountType::Trading => "trading",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "funding" => Some(AccountType::Funding),
            "trading" => Some(AccountType::Trading),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger account. Identity is immutable once created: an account never
/// changes type or owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_type: AccountType,
}

impl Account {
    pub fn new(user_id: Uuid, account_type: AccountType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_type_round_trips() {
        assert_eq!(AccountType::from_str("funding"), Some(AccountType::Funding));
        assert_eq!(AccountType::from_str("trading"), Some(AccountType::Trading));
        assert_eq!(AccountType::from_str("vault"), None);
        assert_eq!(AccountType::Funding.as_str(), "funding");
    }
}
