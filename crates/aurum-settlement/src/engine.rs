//! The settlement engine

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use aurum_fees::FeeSchedule;
use aurum_ledger::{
    check_sufficient, reference_is_wellformed, resolve, AccountDirectory, LedgerError,
    LedgerStore, PostingEngine, Resolution, TradeIntent,
};
use aurum_oracle::PriceOracle;
use aurum_types::{
    parse_qty, truncate8, Account, AccountType, FillDetails, JournalDraft, JournalEntry, Side,
    TradeMetadata,
};

use crate::config::{SettlementConfig, SymbolSpec};
use crate::error::{SettlementError, SettlementResult};
use crate::receipt::{SettlementOutcome, TradeReceipt, RECEIPT_VERSION};

/// A trade request as consumed from the transport layer. The authenticated
/// caller identity supplies the user id separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    /// Decimal string, validated and truncated to scale 8.
    pub qty: String,
    /// Slippage tolerance as a fraction; defaults from config.
    #[serde(default)]
    pub slippage: Option<Decimal>,
    /// Idempotency key, at least 8 characters.
    pub request_id: String,
}

/// Orchestrates the buy/sell settlement state machine.
pub struct SettlementEngine {
    posting: PostingEngine,
    store: Arc<dyn LedgerStore>,
    directory: Arc<dyn AccountDirectory>,
    oracle: Arc<dyn PriceOracle>,
    fees: FeeSchedule,
    config: SettlementConfig,
}

impl SettlementEngine {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        directory: Arc<dyn AccountDirectory>,
        oracle: Arc<dyn PriceOracle>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            posting: PostingEngine::new(store.clone()),
            store,
            directory,
            oracle,
            fees: FeeSchedule::new(config.fee_rate_bps, config.min_fee),
            config,
        }
    }

    /// Settle a buy or sell for the given user.
    ///
    /// Safe to retry: a request replaying an earlier successful call returns
    /// the original receipt with `replayed` set, and a reused key with a
    /// divergent payload is rejected with no side effects.
    pub async fn settle(
        &self,
        user_id: Uuid,
        side: Side,
        request: &TradeRequest,
    ) -> SettlementResult<SettlementOutcome> {
        // VALIDATE_INPUT
        let spec = self.config.symbol(&request.symbol).ok_or_else(|| {
            SettlementError::Validation(format!("unsupported symbol: {}", request.symbol))
        })?;
        let qty = parse_qty(&request.qty)
            .map_err(|e| SettlementError::Validation(e.to_string()))?;
        if !reference_is_wellformed(&request.request_id) {
            return Err(SettlementError::Validation(
                "request_id must be at least 8 characters".to_string(),
            ));
        }
        let tolerance = request
            .slippage
            .unwrap_or(self.config.default_slippage_tolerance);
        if tolerance < Decimal::ZERO {
            return Err(SettlementError::Validation(
                "slippage tolerance must not be negative".to_string(),
            ));
        }

        // CHECK_IDEMPOTENCY
        let intent = TradeIntent {
            side,
            symbol: spec.symbol.clone(),
            qty,
        };
        match resolve(self.store.as_ref(), &request.request_id, &intent).await? {
            Resolution::Replay(journal) => {
                info!(reference = %request.request_id, journal_id = %journal.id, "idempotent replay");
                return Ok(SettlementOutcome {
                    receipt: TradeReceipt::from_journal(&journal),
                    replayed: true,
                });
            }
            Resolution::Conflict => return Err(SettlementError::IdempotencyConflict),
            Resolution::Proceed => {}
        }

        // LOAD_ACCOUNTS
        let accounts = self.directory.find_accounts_for_user(user_id).await?;
        let funding = find_account(&accounts, AccountType::Funding)?;
        let trading = find_account(&accounts, AccountType::Trading)?;

        // SNAPSHOT_PRICE: previous and execution snapshots back to back.
        // TODO: carry the client's quoted price into the request instead of
        // re-polling; two consecutive oracle reads land microseconds apart
        // and understate real quote-to-execution drift.
        let prev = self.oracle.ticker(&spec.oracle_pair).await?;
        let exec = self.oracle.ticker(&spec.oracle_pair).await?;

        // CHECK_SLIPPAGE
        let spread = relative_move(prev.usd, exec.usd);
        if spread > tolerance {
            warn!(
                pair = %spec.oracle_pair,
                %spread,
                %tolerance,
                "slippage tolerance exceeded"
            );
            return Err(SettlementError::SlippageExceeded);
        }
        let spread_bps = truncate8(spread * dec!(10_000));

        // COMPUTE_FEE
        let fee = self.fees.fee_for(qty);

        // CHECK_BALANCE: buy debits funding for qty+fee; sell debits trading
        // for qty, with the fee settled from proceeds.
        let (debited_account, required) = match side {
            Side::Buy => (funding, truncate8(qty + fee)),
            Side::Sell => (trading, qty),
        };
        check_sufficient(
            self.store.as_ref(),
            debited_account.id,
            &spec.backing_asset,
            required,
        )
        .await?;

        // POST_JOURNAL
        let fill = FillDetails {
            symbol: spec.symbol.clone(),
            synthetic_symbol: Some(spec.synthetic_asset.clone()),
            qty,
            price: exec.usd,
            fee,
            spread_bps,
            price_source: exec.source.clone(),
            receipt_v: RECEIPT_VERSION.to_string(),
        };
        let draft = JournalDraft {
            reference: request.request_id.clone(),
            description: format!("{side} {qty} {}", spec.symbol),
            metadata: TradeMetadata::new(side, fill),
            entries: trade_legs(side, spec, funding, trading, self.config.fee_sink_account_id, qty, fee)?,
        };

        match self.posting.post(draft).await {
            Ok(journal) => {
                info!(
                    journal_id = %journal.id,
                    %side,
                    symbol = %spec.symbol,
                    "trade settled"
                );
                Ok(SettlementOutcome {
                    receipt: TradeReceipt::from_journal(&journal),
                    replayed: false,
                })
            }
            // Lost a race against a concurrent request carrying the same
            // reference: re-resolve once, late-arriving replay or conflict.
            Err(LedgerError::DuplicateReference { .. }) => {
                match resolve(self.store.as_ref(), &request.request_id, &intent).await? {
                    Resolution::Replay(journal) => Ok(SettlementOutcome {
                        receipt: TradeReceipt::from_journal(&journal),
                        replayed: true,
                    }),
                    Resolution::Conflict => Err(SettlementError::IdempotencyConflict),
                    Resolution::Proceed => {
                        Err(LedgerError::DuplicateReference {
                            reference: request.request_id.clone(),
                        }
                        .into())
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn find_account(accounts: &[Account], wanted: AccountType) -> SettlementResult<&Account> {
    accounts
        .iter()
        .find(|a| a.account_type == wanted)
        .ok_or_else(|| SettlementError::NotFound(format!("{wanted} account")))
}

/// Relative price movement between two snapshots:
/// `|exec - prev| / max(prev, exec, 1)`.
fn relative_move(prev: Decimal, exec: Decimal) -> Decimal {
    let denom = prev.max(exec).max(Decimal::ONE);
    (exec - prev).abs() / denom
}

/// The balanced entry set for one trade, all legs denominated in the
/// symbol's backing asset.
///
/// BUY:  CREDIT funding (qty+fee), DEBIT trading (qty), DEBIT fee sink (fee)
/// SELL: CREDIT trading (qty), DEBIT funding (qty-fee), DEBIT fee sink (fee)
fn trade_legs(
    side: Side,
    spec: &SymbolSpec,
    funding: &Account,
    trading: &Account,
    fee_sink: Uuid,
    qty: Decimal,
    fee: Decimal,
) -> SettlementResult<Vec<JournalEntry>> {
    let asset = spec.backing_asset.clone();
    let mut legs = match side {
        Side::Buy => vec![
            JournalEntry::credit(funding.id, asset.clone(), truncate8(qty + fee)),
            JournalEntry::debit(trading.id, asset.clone(), qty),
        ],
        Side::Sell => {
            let proceeds = truncate8(qty - fee);
            if proceeds <= Decimal::ZERO {
                return Err(SettlementError::Validation(
                    "quantity too small to cover the fee".to_string(),
                ));
            }
            vec![
                JournalEntry::credit(trading.id, asset.clone(), qty),
                JournalEntry::debit(funding.id, asset.clone(), proceeds),
            ]
        }
    };
    if fee > Decimal::ZERO {
        legs.push(JournalEntry::debit(fee_sink, asset, fee));
    }
    Ok(legs)
}
