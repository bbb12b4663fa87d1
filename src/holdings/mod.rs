pub(crate) mod holdings_errors;
pub(crate) mod holdings_model;
pub(crate) mod holdings_reconciler;
pub(crate) mod holdings_traits;

// Re-export the main public entry points and types
pub use holdings_errors::HoldingError;
pub use holdings_model::Holding;
pub use holdings_reconciler::{HoldingChange, HoldingsReconciler, ReconcileInput};
pub use holdings_traits::HoldingStore;

#[cfg(test)]
pub(crate) mod tests;
