//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use storekeep_core::{StoreId, UserId};

/// A store: the tenant every catalog record belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// Identity-provider user who owns the store.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating or renaming a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInput {
    pub name: String,
}
