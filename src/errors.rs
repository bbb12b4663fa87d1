use thiserror::Error;

use crate::holdings::HoldingError;
use crate::market_data::MarketDataError;
use crate::transactions::TransactionError;
use crate::users::UserError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Holding error: {0}")]
    Holding(#[from] HoldingError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("User error: {0}")]
    User(#[from] UserError),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Stable classification of failures for embedders mapping errors onto a
/// transport (HTTP status codes, gRPC codes, CLI exit codes).
///
/// An exact idempotent replay normally succeeds with
/// [`crate::transactions::TransactionOutcome::Replayed`] and never becomes an
/// `Error`. `DuplicateTransaction` is the category of the commit-time loser
/// when two submissions of the same key race past the replay pre-check; a
/// mismatched payload is the harder `IdempotencyKeyConflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    DuplicateTransaction,
    IdempotencyKeyConflict,
    InsufficientFunds,
    ResourceNotFound,
    PriceUnavailable,
    UnsupportedAsset,
    ConcurrentModification,
    Internal,
}

impl ErrorCategory {
    /// Stable machine-readable code; part of the public contract.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            ErrorCategory::IdempotencyKeyConflict => "IDEMPOTENCY_KEY_CONFLICT",
            ErrorCategory::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCategory::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCategory::PriceUnavailable => "PRICE_UNAVAILABLE",
            ErrorCategory::UnsupportedAsset => "UNSUPPORTED_ASSET",
            ErrorCategory::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    /// Whether retrying the same request unchanged can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::ConcurrentModification | ErrorCategory::PriceUnavailable
        )
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transaction(e) => match e {
                TransactionError::InvalidData(_) | TransactionError::InvalidIdempotencyKey(_) => {
                    ErrorCategory::Validation
                }
                TransactionError::IdempotencyKeyConflict { .. } => {
                    ErrorCategory::IdempotencyKeyConflict
                }
                TransactionError::AlreadyRecorded(_) => ErrorCategory::DuplicateTransaction,
            },
            Error::Holding(e) => match e {
                HoldingError::InsufficientFunds(_) => ErrorCategory::InsufficientFunds,
                HoldingError::NotFound(_) => ErrorCategory::ResourceNotFound,
                HoldingError::VersionConflict(_)
                | HoldingError::ConcurrentModificationExhausted { .. } => {
                    ErrorCategory::ConcurrentModification
                }
                HoldingError::InvalidData(_) => ErrorCategory::Validation,
            },
            Error::MarketData(e) => match e {
                MarketDataError::UnsupportedAsset(_) => ErrorCategory::UnsupportedAsset,
                MarketDataError::Unavailable(_)
                | MarketDataError::Timeout(_)
                | MarketDataError::ParsingError(_) => ErrorCategory::PriceUnavailable,
            },
            Error::User(e) => match e {
                UserError::NotFound(_) => ErrorCategory::ResourceNotFound,
                UserError::InvalidData(_) => ErrorCategory::Validation,
            },
            Error::Storage(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_stable_codes() {
        let err: Error = TransactionError::InvalidIdempotencyKey("bad key".into()).into();
        assert_eq!(err.category().code(), "VALIDATION");

        let err: Error = HoldingError::InsufficientFunds("0.5 > 0.1".into()).into();
        assert_eq!(err.category().code(), "INSUFFICIENT_FUNDS");

        let err: Error = MarketDataError::Timeout("BTC".into()).into();
        assert_eq!(err.category().code(), "PRICE_UNAVAILABLE");

        let err: Error = TransactionError::AlreadyRecorded("k1".into()).into();
        assert_eq!(err.category().code(), "DUPLICATE_TRANSACTION");

        let err: Error = TransactionError::IdempotencyKeyConflict {
            key: "k1".into(),
            fields: vec!["units".into()],
        }
        .into();
        assert_eq!(err.category().code(), "IDEMPOTENCY_KEY_CONFLICT");
    }

    #[test]
    fn only_transient_categories_are_retryable() {
        let transient: Error = HoldingError::ConcurrentModificationExhausted { attempts: 3 }.into();
        assert!(transient.is_retryable());

        let transient: Error = MarketDataError::Unavailable("DOGE".into()).into();
        assert!(transient.is_retryable());

        let permanent: Error = HoldingError::NotFound("bob/BTC".into()).into();
        assert!(!permanent.is_retryable());

        let permanent: Error = TransactionError::AlreadyRecorded("k1".into()).into();
        assert!(!permanent.is_retryable());
    }
}
