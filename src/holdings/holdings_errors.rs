use thiserror::Error;

/// Custom error type for holding-related operations
#[derive(Debug, Error)]
pub enum HoldingError {
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version conflict: {0}")]
    VersionConflict(String),

    #[error("Concurrent modification: holding update failed after {attempts} attempts")]
    ConcurrentModificationExhausted { attempts: u32 },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
