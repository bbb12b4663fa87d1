use log::{debug, error, warn};
use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;

use super::holdings_errors::HoldingError;
use super::holdings_model::Holding;
use super::holdings_traits::HoldingStore;
use crate::constants::{
    AVERAGE_COST_SCALE, MAX_RECONCILE_ATTEMPTS, RECONCILE_BACKOFF_MULTIPLIER,
    RECONCILE_BACKOFF_START_MS,
};
use crate::errors::{Error, Result};
use crate::transactions::TransactionType;

/// One transaction's effect on a single (user, asset) holding.
#[derive(Debug, Clone)]
pub struct ReconcileInput {
    pub user_id: String,
    pub asset_id: String,
    pub transaction_type: TransactionType,
    pub units: Decimal,
    pub price_per_unit: Decimal,
    pub total_cost: Decimal,
}

/// Outcome of applying a transaction to a holding.
#[derive(Debug, Clone)]
pub enum HoldingChange {
    Updated(Holding),
    /// The sell depleted the holding; the row was removed, not kept at zero.
    Removed(Holding),
}

/// Applies one transaction's effect to exactly one holding record using
/// optimistic concurrency: read the row with its version, compute the new
/// state, write conditioned on the version still matching, and retry the
/// whole cycle against a fresh read when another writer got there first.
#[derive(Default, Debug, Clone)]
pub struct HoldingsReconciler {}

impl HoldingsReconciler {
    pub fn new() -> Self {
        HoldingsReconciler {}
    }

    /// Read-compute-conditional-write with bounded retry and multiplicative
    /// backoff. Only version conflicts are retried; every other failure
    /// surfaces on first occurrence.
    pub async fn apply(
        &self,
        store: &dyn HoldingStore,
        input: &ReconcileInput,
    ) -> Result<HoldingChange> {
        let mut backoff = Duration::from_millis(RECONCILE_BACKOFF_START_MS);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.apply_once(store, input).await {
                Ok(change) => return Ok(change),
                Err(Error::Holding(HoldingError::VersionConflict(detail))) => {
                    if attempt >= MAX_RECONCILE_ATTEMPTS {
                        error!(
                            "Holding update for {}/{} lost the version race {} times, giving up",
                            input.user_id, input.asset_id, attempt
                        );
                        return Err(
                            HoldingError::ConcurrentModificationExhausted { attempts: attempt }
                                .into(),
                        );
                    }
                    warn!(
                        "Version conflict on holding {}/{} (attempt {}): {}; retrying in {:?}",
                        input.user_id, input.asset_id, attempt, detail, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= RECONCILE_BACKOFF_MULTIPLIER;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn apply_once(
        &self,
        store: &dyn HoldingStore,
        input: &ReconcileInput,
    ) -> Result<HoldingChange> {
        let existing = store
            .find_holding(&input.user_id, &input.asset_id)
            .await?;

        match input.transaction_type {
            TransactionType::Buy | TransactionType::Airdrop => {
                self.apply_acquisition(store, input, existing).await
            }
            TransactionType::Sell => self.apply_sell(store, input, existing).await,
        }
    }

    async fn apply_acquisition(
        &self,
        store: &dyn HoldingStore,
        input: &ReconcileInput,
        existing: Option<Holding>,
    ) -> Result<HoldingChange> {
        let mut holding = match existing {
            None => {
                debug!(
                    "Opening holding for {}/{} with {} units",
                    input.user_id, input.asset_id, input.units
                );
                let holding =
                    Holding::new(&input.user_id, &input.asset_id, input.units, input.price_per_unit);
                let saved = store.save_holding(&holding).await?;
                return Ok(HoldingChange::Updated(saved));
            }
            Some(holding) => holding,
        };

        let new_units = holding.units + input.units;

        match input.transaction_type {
            TransactionType::Buy => {
                let new_total_cost = holding.total_cost_basis + input.total_cost;
                holding.average_cost_basis = if new_total_cost > Decimal::ZERO {
                    round_average(new_total_cost / new_units)
                } else {
                    // Degenerate zero-cost accumulation; keep the carried
                    // average instead of averaging over nothing.
                    holding.average_cost_basis
                };
                holding.total_cost_basis = new_total_cost;
            }
            TransactionType::Airdrop => {
                // Airdropped units carry no cash cost: the basis stays put
                // and the average dilutes downward.
                holding.average_cost_basis = round_average(holding.total_cost_basis / new_units);
            }
            TransactionType::Sell => unreachable!("sell handled by apply_sell"),
        }

        holding.units = new_units;
        let saved = store.save_holding(&holding).await?;
        Ok(HoldingChange::Updated(saved))
    }

    async fn apply_sell(
        &self,
        store: &dyn HoldingStore,
        input: &ReconcileInput,
        existing: Option<Holding>,
    ) -> Result<HoldingChange> {
        let mut holding = match existing {
            None => {
                error!(
                    "Sell of {} requested but {} holds no {}",
                    input.units, input.user_id, input.asset_id
                );
                return Err(HoldingError::NotFound(format!(
                    "no holding of {} for user {}",
                    input.asset_id, input.user_id
                ))
                .into());
            }
            Some(holding) => holding,
        };

        if input.units > holding.units {
            return Err(HoldingError::InsufficientFunds(format!(
                "sell of {} units exceeds the {} held",
                input.units, holding.units
            ))
            .into());
        }

        let remaining_units = holding.units - input.units;
        if remaining_units == Decimal::ZERO {
            debug!(
                "Sell depletes holding {}/{}; removing row",
                input.user_id, input.asset_id
            );
            store.delete_holding(&holding).await?;
            return Ok(HoldingChange::Removed(holding));
        }

        // The basis shrinks proportionally to the remaining units; the
        // average cost of what remains does not move on a sell.
        holding.total_cost_basis = remaining_units * holding.average_cost_basis;
        holding.units = remaining_units;
        let saved = store.save_holding(&holding).await?;
        Ok(HoldingChange::Updated(saved))
    }
}

fn round_average(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AVERAGE_COST_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
