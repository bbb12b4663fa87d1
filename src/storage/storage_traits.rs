use async_trait::async_trait;

use crate::errors::Result;
use crate::holdings::HoldingStore;
use crate::transactions::TransactionStore;

/// One ledger operation's transaction boundary: every store call inside a
/// `create_transaction` shares this object, and the holding update and the
/// record append become visible together at `commit` or not at all.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Holding access scoped to this unit of work; reads see the unit's own
    /// uncommitted writes.
    fn holdings(&self) -> &dyn HoldingStore;

    /// Transaction-record access scoped to this unit of work.
    fn transactions(&self) -> &dyn TransactionStore;

    /// Atomically publishes all staged writes, revalidating version and
    /// uniqueness preconditions against the live store.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards all staged writes.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Backing store for the ledger: direct read access plus the ability to open
/// a unit of work for the write path.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    fn holdings(&self) -> &dyn HoldingStore;

    fn transactions(&self) -> &dyn TransactionStore;

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}
