pub(crate) mod transactions_constants;
pub(crate) mod transactions_errors;
pub(crate) mod transactions_model;
pub(crate) mod transactions_service;
pub(crate) mod transactions_traits;

pub use transactions_constants::*;
pub use transactions_errors::TransactionError;
pub use transactions_model::{
    NewTransaction, PageMeta, PageRequest, TransactionOutcome, TransactionPage, TransactionRecord,
    TransactionType,
};
pub use transactions_service::TransactionLedger;
pub use transactions_traits::{TransactionLedgerTrait, TransactionStore};
