use async_trait::async_trait;

use super::portfolio_model::PortfolioSnapshot;
use crate::errors::Result;

/// Trait defining the contract for portfolio valuation.
#[async_trait]
pub trait PortfolioValuatorTrait: Send + Sync {
    /// Values all of a user's holdings against current prices. Fails as a
    /// whole if any held asset has no resolvable price; never returns a
    /// partial snapshot.
    async fn get_portfolio(&self, user_id: &str) -> Result<PortfolioSnapshot>;
}
