use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain model for the owner of a set of holdings and transactions.
///
/// Authentication and profile management live outside this crate; the core
/// only needs a stable identifier to key holdings and the idempotency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        User {
            id: id.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}
