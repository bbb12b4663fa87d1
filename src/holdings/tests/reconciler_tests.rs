use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::{Error, Result};
use crate::holdings::{Holding, HoldingChange, HoldingError, HoldingStore, HoldingsReconciler, ReconcileInput};
use crate::storage::MemoryStore;
use crate::transactions::TransactionType;

const USER: &str = "user-1";
const ASSET: &str = "BTC";

fn input(transaction_type: TransactionType, units: Decimal, price: Decimal) -> ReconcileInput {
    let total_cost = match transaction_type {
        TransactionType::Airdrop => Decimal::ZERO,
        _ => units * price,
    };
    ReconcileInput {
        user_id: USER.to_string(),
        asset_id: ASSET.to_string(),
        transaction_type,
        units,
        price_per_unit: price,
        total_cost,
    }
}

fn updated(change: HoldingChange) -> Holding {
    match change {
        HoldingChange::Updated(holding) => holding,
        HoldingChange::Removed(holding) => {
            panic!("expected an updated holding, got removal of {:?}", holding)
        }
    }
}

#[tokio::test]
async fn buy_with_no_prior_holding_opens_row() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    let change = reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(0.5), dec!(30000)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(0.5));
    assert_eq!(holding.total_cost_basis, dec!(15000.0));
    assert_eq!(holding.average_cost_basis, dec!(30000));
    assert_eq!(holding.version, 1);
}

#[tokio::test]
async fn buy_averages_cost_across_lots() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1.0), dec!(30000)))
        .await
        .unwrap();
    let change = reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(0.5), dec!(60000)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(1.5));
    assert_eq!(holding.total_cost_basis, dec!(60000.0));
    assert_eq!(holding.average_cost_basis, dec!(40000));
    assert_eq!(holding.version, 2);
}

#[tokio::test]
async fn airdrop_dilutes_average_without_adding_cost() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1), dec!(100)))
        .await
        .unwrap();
    let change = reconciler
        .apply(&store, &input(TransactionType::Airdrop, dec!(1), dec!(120)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(2));
    assert_eq!(holding.total_cost_basis, dec!(100));
    assert_eq!(holding.average_cost_basis, dec!(50));
}

#[tokio::test]
async fn airdrop_opening_a_holding_seeds_basis_from_market_price() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    let change = reconciler
        .apply(&store, &input(TransactionType::Airdrop, dec!(2), dec!(10)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(2));
    assert_eq!(holding.total_cost_basis, dec!(20));
    assert_eq!(holding.average_cost_basis, dec!(10));
}

#[tokio::test]
async fn sell_shrinks_basis_proportionally_and_keeps_average() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(2.3), dec!(55000)))
        .await
        .unwrap();
    let change = reconciler
        .apply(&store, &input(TransactionType::Sell, dec!(0.5), dec!(70000)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(1.8));
    assert_eq!(holding.total_cost_basis, dec!(99000.0));
    assert_eq!(holding.average_cost_basis, dec!(55000));
}

#[tokio::test]
async fn sell_depleting_holding_removes_row() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1), dec!(100)))
        .await
        .unwrap();
    let change = reconciler
        .apply(&store, &input(TransactionType::Sell, dec!(1), dec!(150)))
        .await
        .unwrap();

    assert!(matches!(change, HoldingChange::Removed(_)));
    assert!(store.find_holding(USER, ASSET).await.unwrap().is_none());
}

#[tokio::test]
async fn sell_exceeding_held_units_is_rejected() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1), dec!(100)))
        .await
        .unwrap();
    let err = reconciler
        .apply(&store, &input(TransactionType::Sell, dec!(2), dec!(150)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Holding(HoldingError::InsufficientFunds(_))
    ));
    let holding = store.find_holding(USER, ASSET).await.unwrap().unwrap();
    assert_eq!(holding.units, dec!(1));
}

#[tokio::test]
async fn sell_without_holding_is_not_found() {
    let store = MemoryStore::new();
    let reconciler = HoldingsReconciler::new();

    let err = reconciler
        .apply(&store, &input(TransactionType::Sell, dec!(1), dec!(100)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Holding(HoldingError::NotFound(_))));
}

/// Store wrapper that lets a rival writer bump the row version right before
/// the first N saves land, forcing version conflicts.
struct ContendedStore {
    inner: MemoryStore,
    conflicts_remaining: AtomicU32,
}

impl ContendedStore {
    fn new(inner: MemoryStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }
}

#[async_trait]
impl HoldingStore for ContendedStore {
    async fn find_holding(&self, user_id: &str, asset_id: &str) -> Result<Option<Holding>> {
        self.inner.find_holding(user_id, asset_id).await
    }

    async fn find_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>> {
        self.inner.find_holdings_for_user(user_id).await
    }

    async fn save_holding(&self, holding: &Holding) -> Result<Holding> {
        let remaining = self.conflicts_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts_remaining.store(remaining - 1, Ordering::SeqCst);
            if let Some(rival) = self.inner.find_holding(&holding.user_id, &holding.asset_id).await? {
                self.inner.save_holding(&rival).await?;
            }
        }
        self.inner.save_holding(holding).await
    }

    async fn delete_holding(&self, holding: &Holding) -> Result<()> {
        self.inner.delete_holding(holding).await
    }
}

#[tokio::test(start_paused = true)]
async fn version_conflict_is_retried_against_a_fresh_read() {
    let inner = MemoryStore::new();
    inner
        .save_holding(&Holding::new(USER, ASSET, dec!(1), dec!(100)))
        .await
        .unwrap();

    let store = ContendedStore::new(inner.clone(), 1);
    let reconciler = HoldingsReconciler::new();

    let change = reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1), dec!(200)))
        .await
        .unwrap();

    let holding = updated(change);
    assert_eq!(holding.units, dec!(2));
    assert_eq!(holding.total_cost_basis, dec!(300));
    assert_eq!(holding.average_cost_basis, dec!(150));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_exhausting_retry_budget() {
    let inner = MemoryStore::new();
    inner
        .save_holding(&Holding::new(USER, ASSET, dec!(1), dec!(100)))
        .await
        .unwrap();

    let store = ContendedStore::new(inner.clone(), 10);
    let reconciler = HoldingsReconciler::new();

    let err = reconciler
        .apply(&store, &input(TransactionType::Buy, dec!(1), dec!(200)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Holding(HoldingError::ConcurrentModificationExhausted { attempts: 3 })
    ));
}
