pub(crate) mod portfolio_model;
pub(crate) mod portfolio_service;
pub(crate) mod portfolio_traits;

pub use portfolio_model::{HoldingView, PortfolioSnapshot};
pub use portfolio_service::PortfolioValuator;
pub use portfolio_traits::PortfolioValuatorTrait;
