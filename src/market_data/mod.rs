pub(crate) mod market_data_cache;
pub(crate) mod market_data_errors;
pub(crate) mod market_data_traits;

// Re-export the public interface
pub use market_data_cache::SymbolCache;
pub use market_data_errors::MarketDataError;
pub use market_data_traits::{bounded_price_lookup, PriceOracle};
