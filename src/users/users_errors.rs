use thiserror::Error;

/// Custom error type for user-related operations
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid user data: {0}")]
    InvalidData(String),
}
