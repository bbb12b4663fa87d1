use std::time::Duration;

/// Decimal scale for average cost basis calculations
pub const AVERAGE_COST_SCALE: u32 = 8;

/// Decimal scale for display/valuation figures
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Maximum attempts for the holding read-compute-write cycle
pub const MAX_RECONCILE_ATTEMPTS: u32 = 3;

/// Initial backoff between reconcile attempts
pub const RECONCILE_BACKOFF_START_MS: u64 = 50;

/// Backoff multiplier applied after each failed reconcile attempt
pub const RECONCILE_BACKOFF_MULTIPLIER: u32 = 3;

/// Upper bound on any single price oracle call
pub const ORACLE_TIMEOUT: Duration = Duration::from_secs(5);
