use async_trait::async_trait;

use super::holdings_model::Holding;
use crate::errors::Result;

/// Trait defining the contract for holding persistence.
///
/// `save_holding` and `delete_holding` are conditional on `holding.version`
/// matching the stored row (version 0 asserts the row does not exist yet).
/// A mismatch fails with [`HoldingError::VersionConflict`] and leaves the
/// store untouched; the reconciler owns the retry policy.
///
/// [`HoldingError::VersionConflict`]: super::HoldingError::VersionConflict
#[async_trait]
pub trait HoldingStore: Send + Sync {
    async fn find_holding(&self, user_id: &str, asset_id: &str) -> Result<Option<Holding>>;

    async fn find_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>>;

    /// Version-checked upsert. Returns the stored row with its new version.
    async fn save_holding(&self, holding: &Holding) -> Result<Holding>;

    /// Version-checked delete of a fully depleted holding.
    async fn delete_holding(&self, holding: &Holding) -> Result<()>;
}
