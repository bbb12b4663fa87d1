pub(crate) mod memory;
pub(crate) mod storage_traits;

pub use memory::MemoryStore;
pub use storage_traits::{LedgerStore, UnitOfWork};
