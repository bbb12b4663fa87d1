use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use coinfolio_core::errors::Result;
use coinfolio_core::market_data::{MarketDataError, PriceOracle, SymbolCache};
use coinfolio_core::portfolio::PortfolioValuator;
use coinfolio_core::storage::MemoryStore;
use coinfolio_core::transactions::TransactionLedger;
use coinfolio_core::users::User;

pub const USER: &str = "user-1";

/// Scripted oracle: fixed symbol mappings and price tables, with an optional
/// artificial delay to exercise the lookup timeout.
pub struct FakeOracle {
    symbols: SymbolCache,
    current: HashMap<String, Decimal>,
    historical: HashMap<String, Decimal>,
    delay: Option<Duration>,
}

impl FakeOracle {
    pub fn new() -> Self {
        let symbols = SymbolCache::new(Duration::from_secs(3600));
        symbols.refresh_with(vec![
            ("BTC".to_string(), "bitcoin".to_string()),
            ("ETH".to_string(), "ethereum".to_string()),
            ("DOGE".to_string(), "dogecoin".to_string()),
        ]);
        FakeOracle {
            symbols,
            current: HashMap::new(),
            historical: HashMap::new(),
            delay: None,
        }
    }

    pub fn with_current_price(mut self, asset_id: &str, price: Decimal) -> Self {
        self.current.insert(asset_id.to_string(), price);
        self
    }

    pub fn with_historical_price(mut self, asset_id: &str, price: Decimal) -> Self {
        self.historical.insert(asset_id.to_string(), price);
        self
    }

    /// Every price call stalls for the given duration before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PriceOracle for FakeOracle {
    async fn resolve_asset_symbol(&self, input: &str) -> String {
        self.symbols.resolve(input)
    }

    async fn get_current_price(&self, asset_id: &str) -> Result<Decimal> {
        self.stall().await;
        self.current.get(asset_id).copied().ok_or_else(|| {
            MarketDataError::Unavailable(format!("no current price for '{}'", asset_id)).into()
        })
    }

    async fn get_historical_price(&self, asset_id: &str, date: NaiveDate) -> Result<Decimal> {
        self.stall().await;
        self.historical.get(asset_id).copied().ok_or_else(|| {
            MarketDataError::Unavailable(format!("no price for '{}' at {}", asset_id, date)).into()
        })
    }
}

/// A fresh in-memory store with one seeded user, plus the ledger wired to it.
pub fn ledger_fixture(oracle: FakeOracle) -> (MemoryStore, TransactionLedger) {
    let store = MemoryStore::new();
    store
        .put_user(User::new(USER, "user@example.com"))
        .unwrap();
    let shared = Arc::new(store.clone());
    let ledger = TransactionLedger::new(shared.clone(), shared, Arc::new(oracle));
    (store, ledger)
}

pub fn valuator_fixture(store: &MemoryStore, oracle: FakeOracle) -> PortfolioValuator {
    PortfolioValuator::new(Arc::new(store.clone()), Arc::new(oracle))
}
