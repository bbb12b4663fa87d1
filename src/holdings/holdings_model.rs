use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::holdings_errors::HoldingError;
use crate::constants::AVERAGE_COST_SCALE;

/// One row per (user, asset): the units currently held and the capital spent
/// to acquire them. A holding never survives at zero units; a fully depleting
/// sell removes the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub asset_id: String,
    pub units: Decimal,
    pub total_cost_basis: Decimal,
    /// Carried-forward per-unit basis, maintained by the reconciler.
    pub average_cost_basis: Decimal,
    /// Optimistic concurrency counter; 0 means not yet persisted.
    pub version: i64,
}

impl Holding {
    /// First acquisition of an asset: basis is seeded at units x unit price.
    pub fn new(
        user_id: impl Into<String>,
        asset_id: impl Into<String>,
        units: Decimal,
        price_per_unit: Decimal,
    ) -> Self {
        Holding {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            asset_id: asset_id.into(),
            units,
            total_cost_basis: units * price_per_unit,
            average_cost_basis: price_per_unit,
            version: 0,
        }
    }

    /// Derived per-unit basis, rounded half-up to [`AVERAGE_COST_SCALE`].
    /// Fails fast when units are not positive; a holding in that state is a
    /// bug upstream, not a value to average over.
    pub fn derived_average_cost_basis(&self) -> Result<Decimal, HoldingError> {
        if self.units <= Decimal::ZERO {
            return Err(HoldingError::InvalidData(format!(
                "average cost basis undefined for {} units of {}",
                self.units, self.asset_id
            )));
        }
        if self.total_cost_basis <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        Ok((self.total_cost_basis / self.units)
            .round_dp_with_strategy(AVERAGE_COST_SCALE, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_holding_seeds_basis_from_unit_price() {
        let holding = Holding::new("u1", "bitcoin", dec!(0.1), dec!(100000));
        assert_eq!(holding.units, dec!(0.1));
        assert_eq!(holding.total_cost_basis, dec!(10000.0));
        assert_eq!(holding.average_cost_basis, dec!(100000));
        assert_eq!(holding.version, 0);
    }

    #[test]
    fn derived_average_rounds_half_up_to_eight_places() {
        let mut holding = Holding::new("u1", "ethereum", dec!(3), dec!(1000));
        holding.total_cost_basis = dec!(100);
        // 100 / 3 = 33.333333333... -> 33.33333333
        assert_eq!(
            holding.derived_average_cost_basis().unwrap(),
            dec!(33.33333333)
        );
    }

    #[test]
    fn derived_average_fails_fast_on_non_positive_units() {
        let mut holding = Holding::new("u1", "bitcoin", dec!(1), dec!(50000));
        holding.units = Decimal::ZERO;
        assert!(holding.derived_average_cost_basis().is_err());
    }

    #[test]
    fn derived_average_is_zero_for_zero_basis() {
        let mut holding = Holding::new("u1", "bitcoin", dec!(2), dec!(50000));
        holding.total_cost_basis = Decimal::ZERO;
        assert_eq!(holding.derived_average_cost_basis().unwrap(), Decimal::ZERO);
    }
}
