use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::holdings::Holding;

/// View of one holding valued at the current price. All figures are rounded
/// to 2 decimals before they are summed into the snapshot totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingView {
    pub asset_id: String,
    pub units: Decimal,
    pub valuation: Decimal,
    pub invested_amount: Decimal,
    pub unrealized_pnl: Decimal,
    pub portfolio_weight: Decimal,
}

impl HoldingView {
    /// Plain mapping from the persisted holding shape; the weight is filled
    /// in once the snapshot total is known.
    pub(crate) fn from_holding(holding: &Holding, current_price: Decimal) -> Self {
        let invested_amount = round_display(holding.total_cost_basis);
        let valuation = round_display(holding.units * current_price);
        let unrealized_pnl = round_display(valuation - invested_amount);
        HoldingView {
            asset_id: holding.asset_id.clone(),
            units: holding.units,
            valuation,
            invested_amount,
            unrealized_pnl,
            portfolio_weight: Decimal::ZERO,
        }
    }
}

/// Derived, never persisted: recomputed from holdings and prices on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub total_invested: Decimal,
    pub total_valuation: Decimal,
    pub current_pnl: Decimal,
    pub holdings: Vec<HoldingView>,
}

impl PortfolioSnapshot {
    /// A user with no holdings has a valid all-zero portfolio.
    pub fn empty() -> Self {
        PortfolioSnapshot {
            total_invested: Decimal::ZERO,
            total_valuation: Decimal::ZERO,
            current_pnl: Decimal::ZERO,
            holdings: Vec::new(),
        }
    }
}

pub(crate) fn round_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(
        DISPLAY_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    )
}
