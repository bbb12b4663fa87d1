use thiserror::Error;

/// Failure modes of the external price oracle, as seen by the core.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Price unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported asset: {0}")]
    UnsupportedAsset(String),

    #[error("Price lookup timed out: {0}")]
    Timeout(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),
}
