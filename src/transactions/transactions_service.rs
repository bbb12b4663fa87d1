use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use log::{debug, error, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::transactions_constants::IDEMPOTENCY_KEY_PATTERN;
use super::transactions_errors::TransactionError;
use super::transactions_model::{
    NewTransaction, PageRequest, TransactionOutcome, TransactionPage, TransactionRecord,
    TransactionType,
};
use super::transactions_traits::TransactionLedgerTrait;
use crate::errors::Result;
use crate::holdings::{HoldingsReconciler, ReconcileInput};
use crate::market_data::{bounded_price_lookup, PriceOracle};
use crate::storage::{LedgerStore, UnitOfWork};
use crate::users::{UserError, UserStore};

/// Top-level orchestrator for the transaction ledger: validates idempotency,
/// resolves a price, builds the immutable record, and folds it into the
/// holding inside one unit of work.
pub struct TransactionLedger {
    ledger_store: Arc<dyn LedgerStore>,
    user_store: Arc<dyn UserStore>,
    price_oracle: Arc<dyn PriceOracle>,
    reconciler: HoldingsReconciler,
}

impl TransactionLedger {
    /// Creates a new TransactionLedger instance with injected dependencies
    pub fn new(
        ledger_store: Arc<dyn LedgerStore>,
        user_store: Arc<dyn UserStore>,
        price_oracle: Arc<dyn PriceOracle>,
    ) -> Self {
        Self {
            ledger_store,
            user_store,
            price_oracle,
            reconciler: HoldingsReconciler::new(),
        }
    }

    async fn require_user(&self, user_id: &str) -> Result<()> {
        match self.user_store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => {
                error!("User {} not found; transaction not processed", user_id);
                Err(UserError::NotFound(format!("user {} not found", user_id)).into())
            }
        }
    }

    /// Compares a replayed request against the stored record. An exact match
    /// (asset, type, units) is a side-effect-free replay; anything else is a
    /// hard conflict naming the mismatched fields.
    fn classify_replay(
        existing: TransactionRecord,
        asset_id: &str,
        request: &NewTransaction,
        idempotency_key: &str,
    ) -> Result<TransactionOutcome> {
        let mut mismatched = Vec::new();
        if existing.asset_id != asset_id {
            mismatched.push("asset".to_string());
        }
        if existing.transaction_type != request.transaction_type {
            mismatched.push("transactionType".to_string());
        }
        if existing.units != request.units {
            mismatched.push("units".to_string());
        }

        if mismatched.is_empty() {
            info!(
                "Idempotency key '{}' replayed for user {}; returning existing record",
                idempotency_key, existing.user_id
            );
            Ok(TransactionOutcome::Replayed(existing))
        } else {
            Err(TransactionError::IdempotencyKeyConflict {
                key: idempotency_key.to_string(),
                fields: mismatched,
            }
            .into())
        }
    }

    /// Resolves the unit price and the record timestamp. A date equal to
    /// today is a current transaction, not a historical one.
    async fn resolve_price(
        &self,
        asset_id: &str,
        request: &NewTransaction,
    ) -> Result<(Decimal, DateTime<Utc>)> {
        let today = Utc::now().date_naive();
        match request.transaction_date {
            Some(date) if date < today => {
                debug!("Resolving historical price for {} at {}", asset_id, date);
                let price = bounded_price_lookup(
                    asset_id,
                    self.price_oracle.get_historical_price(asset_id, date),
                )
                .await?;
                let timestamp = date.and_time(NaiveTime::MIN).and_utc();
                Ok((price, timestamp))
            }
            _ => {
                let price =
                    bounded_price_lookup(asset_id, self.price_oracle.get_current_price(asset_id))
                        .await?;
                Ok((price, Utc::now()))
            }
        }
    }

    /// Holding update and ledger append inside one open unit of work; the
    /// caller commits or rolls back.
    async fn apply_and_persist(
        &self,
        unit_of_work: &dyn UnitOfWork,
        record: &TransactionRecord,
    ) -> Result<()> {
        let input = ReconcileInput {
            user_id: record.user_id.clone(),
            asset_id: record.asset_id.clone(),
            transaction_type: record.transaction_type,
            units: record.units,
            price_per_unit: record.price_per_unit,
            total_cost: record.total_cost,
        };
        self.reconciler
            .apply(unit_of_work.holdings(), &input)
            .await?;
        unit_of_work
            .transactions()
            .save_transaction(record)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TransactionLedgerTrait for TransactionLedger {
    async fn create_transaction(
        &self,
        request: NewTransaction,
        idempotency_key: &str,
        user_id: &str,
    ) -> Result<TransactionOutcome> {
        if !IDEMPOTENCY_KEY_PATTERN.is_match(idempotency_key) {
            return Err(TransactionError::InvalidIdempotencyKey(
                "key must be 1-75 characters of alphanumerics, '.', '_' or '-'".to_string(),
            )
            .into());
        }
        request.validate()?;
        self.require_user(user_id).await?;

        // Replay detection comes before any price lookup so replays stay
        // side-effect free. Symbol resolution is a pure mapping, never a
        // price call, so it is safe to resolve before comparing.
        let existing = self
            .ledger_store
            .transactions()
            .find_transaction(user_id, idempotency_key)
            .await?;
        let asset_id = self.price_oracle.resolve_asset_symbol(request.asset.trim()).await;

        if let Some(existing) = existing {
            return Self::classify_replay(existing, &asset_id, &request, idempotency_key);
        }

        let (price_per_unit, timestamp) = self.resolve_price(&asset_id, &request).await?;

        // Airdropped assets have zero cash cost by definition, even though
        // they carry a market price for valuation purposes.
        let total_cost = match request.transaction_type {
            TransactionType::Airdrop => Decimal::ZERO,
            TransactionType::Buy | TransactionType::Sell => price_per_unit * request.units,
        };

        let record = TransactionRecord::new(
            user_id,
            &asset_id,
            request.transaction_type,
            request.units,
            total_cost,
            price_per_unit,
            idempotency_key,
            timestamp,
        )?;

        let unit_of_work = self.ledger_store.begin().await?;
        match self.apply_and_persist(unit_of_work.as_ref(), &record).await {
            Ok(()) => {
                unit_of_work.commit().await?;
                debug!(
                    "Transaction {} recorded for user {} ({} {} {})",
                    record.id, user_id, record.transaction_type, record.units, record.asset_id
                );
                Ok(TransactionOutcome::Created(record))
            }
            Err(err) => {
                if let Err(rollback_err) = unit_of_work.rollback().await {
                    error!(
                        "Rollback failed after ledger error for user {}: {}",
                        user_id, rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn get_transactions(&self, user_id: &str, page: PageRequest) -> Result<TransactionPage> {
        self.require_user(user_id).await?;
        self.ledger_store
            .transactions()
            .list_transactions(user_id, &page)
            .await
    }
}
