//! PostgreSQL ledger store
//!
//! Implements the ledger storage contract on three tables:
//!
//! - `accounts(id, user_id, type)`
//! - `ledger_balances(account_id, asset, balance)` - materialized balances
//! - `ledger_journal(id, reference UNIQUE, ts, description, metadata, entries)`
//!
//! `commit` runs in one transaction: every touched balance row is locked
//! with `SELECT ... FOR UPDATE` before it is read, so two concurrent
//! settlements against the same `(account, asset)` serialize at the
//! balance-check/debit boundary. Any failure rolls back the whole journal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::error;
use uuid::Uuid;

use aurum_ledger::{AccountDirectory, LedgerError, LedgerResult, LedgerStore};
use aurum_types::{truncate8, Account, AccountType, Asset, Direction, Journal, JournalEntry};

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_err(e: sqlx::Error) -> LedgerError {
    error!(error = %e, "ledger query failed");
    LedgerError::Storage(e.to_string())
}

fn decode_err(e: serde_json::Error) -> LedgerError {
    error!(error = %e, "journal payload failed to decode");
    LedgerError::Storage(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}

fn journal_from_row(row: &sqlx::postgres::PgRow) -> LedgerResult<Journal> {
    let metadata: serde_json::Value = row.try_get("metadata").map_err(storage_err)?;
    let entries: serde_json::Value = row.try_get("entries").map_err(storage_err)?;
    Ok(Journal {
        id: row.try_get("id").map_err(storage_err)?,
        reference: row.try_get("reference").map_err(storage_err)?,
        description: row.try_get("description").map_err(storage_err)?,
        metadata: serde_json::from_value(metadata).map_err(decode_err)?,
        entries: serde_json::from_value(entries).map_err(decode_err)?,
        ts: row.try_get::<DateTime<Utc>, _>("ts").map_err(storage_err)?,
    })
}

async fn apply_leg(
    tx: &mut Transaction<'_, Postgres>,
    entry: &JournalEntry,
) -> LedgerResult<()> {
    // Row lock: held until commit/rollback, serializing concurrent writers
    // on this (account, asset).
    let current: Option<Decimal> = sqlx::query_scalar(
        "SELECT balance FROM ledger_balances WHERE account_id = $1 AND asset = $2 FOR UPDATE",
    )
    .bind(entry.account_id)
    .bind(entry.asset.as_str())
    .fetch_optional(&mut **tx)
    .await
    .map_err(storage_err)?;

    let current = current.unwrap_or(Decimal::ZERO);
    let next = match entry.direction {
        Direction::Debit => current + entry.amount,
        Direction::Credit => current - entry.amount,
    };
    if next < Decimal::ZERO {
        return Err(LedgerError::InsufficientBalance {
            account_id: entry.account_id,
            asset: entry.asset.clone(),
        });
    }

    sqlx::query(
        r#"
        INSERT INTO ledger_balances (account_id, asset, balance)
        VALUES ($1, $2, $3)
        ON CONFLICT (account_id, asset) DO UPDATE SET balance = EXCLUDED.balance
        "#,
    )
    .bind(entry.account_id)
    .bind(entry.asset.as_str())
    .bind(truncate8(next))
    .execute(&mut **tx)
    .await
    .map_err(storage_err)?;

    Ok(())
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn find_journal_by_reference(&self, reference: &str) -> LedgerResult<Option<Journal>> {
        let row = sqlx::query(
            "SELECT id, reference, ts, description, metadata, entries FROM ledger_journal WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.as_ref().map(journal_from_row).transpose()
    }

    async fn balance(&self, account_id: Uuid, asset: &Asset) -> LedgerResult<Decimal> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            "SELECT balance FROM ledger_balances WHERE account_id = $1 AND asset = $2",
        )
        .bind(account_id)
        .bind(asset.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn commit(&self, journal: Journal) -> LedgerResult<Journal> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Lock rows in a stable order so concurrent multi-leg journals
        // cannot deadlock.
        let mut legs = journal.entries.clone();
        legs.sort_by(|a, b| (a.account_id, &a.asset).cmp(&(b.account_id, &b.asset)));
        for leg in &legs {
            apply_leg(&mut tx, leg).await?;
        }

        let metadata = serde_json::to_value(&journal.metadata)
            .map_err(decode_err)?;
        let entries = serde_json::to_value(&journal.entries).map_err(decode_err)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO ledger_journal (id, reference, ts, description, metadata, entries)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(journal.id)
        .bind(&journal.reference)
        .bind(journal.ts)
        .bind(&journal.description)
        .bind(metadata)
        .bind(entries)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(LedgerError::DuplicateReference {
                    reference: journal.reference.clone(),
                });
            }
            return Err(storage_err(e));
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(journal)
    }

    async fn recent_journals(&self, limit: usize) -> LedgerResult<Vec<Journal>> {
        let rows = sqlx::query(
            "SELECT id, reference, ts, description, metadata, entries FROM ledger_journal ORDER BY ts DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(journal_from_row).collect()
    }
}

#[async_trait]
impl AccountDirectory for PgLedger {
    async fn find_accounts_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query("SELECT id, user_id, type FROM accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("type").map_err(storage_err)?;
                let account_type = AccountType::from_str(&raw).ok_or_else(|| {
                    LedgerError::Storage(format!("unknown account type: {raw}"))
                })?;
                Ok(Account {
                    id: row.try_get("id").map_err(storage_err)?,
                    user_id: row.try_get("user_id").map_err(storage_err)?,
                    account_type,
                })
            })
            .collect()
    }
}
