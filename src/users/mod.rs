pub(crate) mod users_errors;
pub(crate) mod users_model;
pub(crate) mod users_traits;

pub use users_errors::UserError;
pub use users_model::User;
pub use users_traits::UserStore;
