use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::portfolio_model::{round_display, HoldingView, PortfolioSnapshot};
use super::portfolio_traits::PortfolioValuatorTrait;
use crate::errors::Result;
use crate::holdings::HoldingStore;
use crate::market_data::{bounded_price_lookup, PriceOracle};

/// Aggregates a user's holdings into a valued snapshot: invested capital,
/// market value, unrealized P&L, and per-asset weights.
pub struct PortfolioValuator {
    holding_store: Arc<dyn HoldingStore>,
    price_oracle: Arc<dyn PriceOracle>,
}

impl PortfolioValuator {
    /// Creates a new PortfolioValuator instance with injected dependencies
    pub fn new(holding_store: Arc<dyn HoldingStore>, price_oracle: Arc<dyn PriceOracle>) -> Self {
        Self {
            holding_store,
            price_oracle,
        }
    }

    /// One price per distinct asset, fetched concurrently; the oracle is
    /// never asked twice for the same asset within one call.
    async fn fetch_prices(&self, asset_ids: BTreeSet<String>) -> Result<HashMap<String, Decimal>> {
        let lookups = asset_ids.into_iter().map(|asset_id| {
            let oracle = Arc::clone(&self.price_oracle);
            async move {
                let price =
                    bounded_price_lookup(&asset_id, oracle.get_current_price(&asset_id)).await?;
                Ok::<(String, Decimal), crate::errors::Error>((asset_id, price))
            }
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }
}

#[async_trait]
impl PortfolioValuatorTrait for PortfolioValuator {
    async fn get_portfolio(&self, user_id: &str) -> Result<PortfolioSnapshot> {
        let holdings = self.holding_store.find_holdings_for_user(user_id).await?;
        if holdings.is_empty() {
            debug!("User {} has no holdings; returning empty snapshot", user_id);
            return Ok(PortfolioSnapshot::empty());
        }

        let asset_ids: BTreeSet<String> =
            holdings.iter().map(|h| h.asset_id.clone()).collect();
        let prices = self.fetch_prices(asset_ids).await?;

        // Each holding's figures are rounded to 2 decimals first; the totals
        // are sums of those rounded figures. Summing unrounded values can
        // differ by a cent, and that order is part of the observable
        // behavior.
        let mut views: Vec<HoldingView> = holdings
            .iter()
            .map(|holding| {
                let price = prices[&holding.asset_id];
                HoldingView::from_holding(holding, price)
            })
            .collect();

        let total_invested: Decimal = views.iter().map(|v| v.invested_amount).sum();
        let total_valuation: Decimal = views.iter().map(|v| v.valuation).sum();

        for view in &mut views {
            view.portfolio_weight = if total_valuation > Decimal::ZERO {
                round_display(view.valuation / total_valuation * Decimal::ONE_HUNDRED)
            } else {
                Decimal::ZERO
            };
        }

        Ok(PortfolioSnapshot {
            total_invested,
            total_valuation,
            current_pnl: total_valuation - total_invested,
            holdings: views,
        })
    }
}
