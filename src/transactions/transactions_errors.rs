use thiserror::Error;

/// Custom error type for ledger operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid idempotency key: {0}")]
    InvalidIdempotencyKey(String),

    #[error("Idempotency key '{key}' reused with a different payload (mismatched: {})", .fields.join(", "))]
    IdempotencyKeyConflict { key: String, fields: Vec<String> },

    #[error("Transaction already recorded for idempotency key '{0}'")]
    AlreadyRecorded(String),
}
