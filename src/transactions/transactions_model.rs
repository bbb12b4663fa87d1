use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::transactions_constants::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_TRANSACTION_AGE_MONTHS, MAX_TRANSACTION_UNITS,
    MIN_TRANSACTION_UNITS,
};
use super::transactions_errors::TransactionError;

/// The three ways units enter or leave a holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Airdrop,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Airdrop => write!(f, "AIRDROP"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            "AIRDROP" => Ok(TransactionType::Airdrop),
            other => Err(TransactionError::InvalidData(format!(
                "unknown transaction type '{}'",
                other
            ))),
        }
    }
}

/// Immutable ledger entry. Constructed once by the ledger, never mutated or
/// deleted; (user_id, idempotency_key) is unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    pub asset_id: String,
    pub transaction_type: TransactionType,
    pub units: Decimal,
    pub total_cost: Decimal,
    pub price_per_unit: Decimal,
    pub idempotency_key: String,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Enforces the record invariants: positive units, non-negative cost, and
    /// the airdrop/cost coupling (zero cash cost exactly when airdropped).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: impl Into<String>,
        asset_id: impl Into<String>,
        transaction_type: TransactionType,
        units: Decimal,
        total_cost: Decimal,
        price_per_unit: Decimal,
        idempotency_key: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TransactionError> {
        if units <= Decimal::ZERO {
            return Err(TransactionError::InvalidData(
                "units must be greater than zero".to_string(),
            ));
        }
        if total_cost < Decimal::ZERO {
            return Err(TransactionError::InvalidData(
                "total cost must not be negative".to_string(),
            ));
        }
        let is_airdrop = transaction_type == TransactionType::Airdrop;
        if is_airdrop && total_cost != Decimal::ZERO {
            return Err(TransactionError::InvalidData(
                "airdrops carry no cash cost".to_string(),
            ));
        }
        if !is_airdrop && total_cost == Decimal::ZERO {
            return Err(TransactionError::InvalidData(
                "total cost must be greater than zero for non-airdrop transactions".to_string(),
            ));
        }

        Ok(TransactionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            asset_id: asset_id.into(),
            transaction_type,
            units,
            total_cost,
            price_per_unit,
            idempotency_key: idempotency_key.into(),
            timestamp,
        })
    }
}

/// Input model for submitting a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub asset: String,
    pub transaction_type: TransactionType,
    pub units: Decimal,
    /// Past date for a backdated transaction; absent (or today) means "now"
    /// and a current-price lookup.
    pub transaction_date: Option<NaiveDate>,
}

impl NewTransaction {
    /// Validates the request before any side effect.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.asset.trim().is_empty() {
            return Err(TransactionError::InvalidData(
                "asset cannot be empty".to_string(),
            ));
        }
        if self.units < MIN_TRANSACTION_UNITS {
            return Err(TransactionError::InvalidData(format!(
                "units must be at least {}",
                MIN_TRANSACTION_UNITS
            )));
        }
        if self.units > MAX_TRANSACTION_UNITS {
            return Err(TransactionError::InvalidData(format!(
                "units must not exceed {}",
                MAX_TRANSACTION_UNITS
            )));
        }

        if let Some(date) = self.transaction_date {
            let today = Utc::now().date_naive();
            if date > today {
                return Err(TransactionError::InvalidData(
                    "transaction date must not be in the future".to_string(),
                ));
            }
            let oldest = today
                .checked_sub_months(Months::new(MAX_TRANSACTION_AGE_MONTHS))
                .unwrap_or(today);
            if date < oldest {
                return Err(TransactionError::InvalidData(format!(
                    "transactions older than {} months are not allowed",
                    MAX_TRANSACTION_AGE_MONTHS
                )));
            }
        }
        Ok(())
    }
}

/// Result of `create_transaction`: a replayed idempotency key is not an error
/// to business logic, but callers can tell the two apart.
#[derive(Debug, Clone)]
pub enum TransactionOutcome {
    Created(TransactionRecord),
    /// The same (user, key, payload) was seen before; this is the original
    /// record and no state was mutated.
    Replayed(TransactionRecord),
}

impl TransactionOutcome {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            TransactionOutcome::Created(record) | TransactionOutcome::Replayed(record) => record,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, TransactionOutcome::Replayed(_))
    }
}

/// Zero-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        PageRequest { page, page_size }
    }

    pub(crate) fn clamped(&self) -> (i64, i64) {
        let page = self.page.max(0);
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_row_count: i64,
}

/// One page of a user's ledger, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub data: Vec<TransactionRecord>,
    pub meta: PageMeta,
}

impl TransactionPage {
    /// Orders newest-first and slices out the requested page.
    pub fn paginate(mut records: Vec<TransactionRecord>, page: &PageRequest) -> Self {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let (page_number, page_size) = page.clamped();
        let total = records.len() as i64;
        // A huge page number must clamp to an empty slice, not overflow.
        let start = page_number
            .checked_mul(page_size)
            .map_or(total, |offset| offset.min(total));
        let end = start.saturating_add(page_size).min(total);
        TransactionPage {
            data: records[start as usize..end as usize].to_vec(),
            meta: PageMeta {
                page: page_number,
                page_size,
                total_row_count: total,
            },
        }
    }
}
