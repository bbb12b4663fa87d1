use async_trait::async_trait;

use super::transactions_model::{
    NewTransaction, PageRequest, TransactionOutcome, TransactionPage, TransactionRecord,
};
use crate::errors::Result;

/// Trait defining the contract for transaction persistence.
///
/// `save_transaction` must enforce the (user_id, idempotency_key) uniqueness
/// atomically; a violation fails with [`TransactionError::AlreadyRecorded`].
///
/// [`TransactionError::AlreadyRecorded`]: super::TransactionError::AlreadyRecorded
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_transaction(
        &self,
        user_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<TransactionRecord>>;

    async fn save_transaction(&self, record: &TransactionRecord) -> Result<TransactionRecord>;

    async fn list_transactions(
        &self,
        user_id: &str,
        page: &PageRequest,
    ) -> Result<TransactionPage>;
}

/// Trait defining the contract for ledger operations.
#[async_trait]
pub trait TransactionLedgerTrait: Send + Sync {
    /// Accepts a transaction exactly once per (user, idempotency key):
    /// resolves a price, folds the effect into the holding, and appends the
    /// immutable record, all in one unit of work.
    async fn create_transaction(
        &self,
        request: NewTransaction,
        idempotency_key: &str,
        user_id: &str,
    ) -> Result<TransactionOutcome>;

    async fn get_transactions(&self, user_id: &str, page: PageRequest) -> Result<TransactionPage>;
}
