//! Balance validation

use rust_decimal::Decimal;
use uuid::Uuid;

use aurum_types::Asset;

use crate::{LedgerError, LedgerResult, LedgerStore};

/// Confirm the account can cover a prospective debit of `required`.
///
/// This is the pre-flight check: it reports insufficiency before any
/// mutation is attempted. The authoritative check is re-executed inside the
/// commit transaction under a row lock, so a concurrent trade that drains
/// the balance between this read and the commit is still caught there.
pub async fn check_sufficient(
    store: &dyn LedgerStore,
    account_id: Uuid,
    asset: &Asset,
    required: Decimal,
) -> LedgerResult<()> {
    let available = store.balance(account_id, asset).await?;
    if available < required {
        return Err(LedgerError::InsufficientBalance {
            account_id,
            asset: asset.clone(),
        });
    }
    Ok(())
}
