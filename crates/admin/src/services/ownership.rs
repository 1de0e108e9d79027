//! The ownership check.
//!
//! A catalog record may only be changed by the user who owns its store. Every
//! mutating API handler and every dashboard page goes through
//! [`require_store_owner`] before touching the database.

use sqlx::PgPool;

use storekeep_core::{StoreId, UserId};

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::models::Store;

/// Load the store if `user_id` owns it.
///
/// A store that does not exist and a store owned by somebody else are
/// indistinguishable to the caller.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the user does not own the store.
/// Returns `AppError::Database` if the lookup fails.
pub async fn require_store_owner(
    pool: &PgPool,
    store_id: StoreId,
    user_id: &UserId,
) -> Result<Store, AppError> {
    StoreRepository::new(pool)
        .get_owned(store_id, user_id)
        .await?
        .ok_or(AppError::Forbidden)
}
