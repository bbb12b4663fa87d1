use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::future::Future;

use super::market_data_errors::MarketDataError;
use crate::constants::ORACLE_TIMEOUT;
use crate::errors::Result;

/// Contract for the external market data collaborator.
///
/// Implementations are expected to be remote (HTTP, cache-backed, etc.) and
/// live outside this crate. All price lookups made by the core are wrapped in
/// [`bounded_price_lookup`] so a hung provider cannot stall a transaction.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Resolves a human-entered symbol or name to a canonical asset id.
    /// Never fails: unknown inputs fall back to a normalized lower-case form.
    async fn resolve_asset_symbol(&self, input: &str) -> String;

    /// Current unit price in the quote currency.
    async fn get_current_price(&self, asset_id: &str) -> Result<Decimal>;

    /// Unit price at the close of a past date.
    async fn get_historical_price(&self, asset_id: &str, date: NaiveDate) -> Result<Decimal>;
}

/// Bounds a single oracle call by [`ORACLE_TIMEOUT`]; a timeout surfaces as a
/// price-unavailable failure rather than hanging the caller.
pub async fn bounded_price_lookup<F, T>(asset_id: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(ORACLE_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(MarketDataError::Timeout(format!(
            "no price for '{}' within {:?}",
            asset_id, ORACLE_TIMEOUT
        ))
        .into()),
    }
}
