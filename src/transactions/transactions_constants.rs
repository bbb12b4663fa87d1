use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Smallest accepted transaction size
pub const MIN_TRANSACTION_UNITS: Decimal = dec!(0.00001);

/// Largest accepted transaction size
pub const MAX_TRANSACTION_UNITS: Decimal = dec!(1000);

/// Oldest accepted backdated transaction, in months before today
pub const MAX_TRANSACTION_AGE_MONTHS: u32 = 12;

/// Default page size for transaction listings
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

lazy_static! {
    /// Allow-listed client idempotency keys: alphanumerics plus `.`, `_`, `-`,
    /// 1 to 75 characters.
    pub static ref IDEMPOTENCY_KEY_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9._-]{1,75}$").expect("idempotency key pattern is valid");
}
