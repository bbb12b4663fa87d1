pub mod constants;
pub mod errors;

pub mod holdings;
pub mod market_data;
pub mod portfolio;
pub mod storage;
pub mod transactions;
pub mod users;

pub use errors::{Error, ErrorCategory, Result};
pub use portfolio::*;
pub use transactions::*;
