use async_trait::async_trait;

use super::users_model::User;
use crate::errors::Result;

/// Trait defining the contract for user lookups.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;
}
