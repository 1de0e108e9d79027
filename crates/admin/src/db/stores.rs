//! Store repository for database operations.
//!
//! Stores are the tenant root. Every lookup that could lead to a mutation is
//! keyed by both the store id and the owning user id.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use storekeep_core::{StoreId, UserId};

use super::RepositoryError;
use crate::models::{Store, StoreInput};

/// Conflict message when a delete is blocked by referencing records.
pub const IN_USE: &str = "Make sure you removed all products and categories first.";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` store queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let user_id = UserId::parse(&row.user_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid user id in database: {e}"))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Per-store record counts for the overview page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct StoreCounts {
    pub billboards: i64,
    pub categories: i64,
    pub sizes: i64,
    pub colors: i64,
    pub products: i64,
    pub featured_products: i64,
    pub archived_products: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every store owned by a user, oldest first (store switcher order).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, user_id, created_at, updated_at
            FROM admin.store
            WHERE user_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The user's oldest store, if they have any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_for_user(&self, user_id: &UserId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, user_id, created_at, updated_at
            FROM admin.store
            WHERE user_id = $1
            ORDER BY created_at ASC
            LIMIT 1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a store only if it is owned by the given user.
    ///
    /// This is the ownership check: `None` means the store does not exist or
    /// belongs to somebody else, and callers must not distinguish the two.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: StoreId,
        user_id: &UserId,
    ) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            SELECT id, name, user_id, created_at, updated_at
            FROM admin.store
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a store for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: &UserId,
        input: &StoreInput,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            INSERT INTO admin.store (name, user_id)
            VALUES ($1, $2)
            RETURNING id, name, user_id, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(user_id.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Rename a store owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user owns no such store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn rename(
        &self,
        id: StoreId,
        user_id: &UserId,
        input: &StoreInput,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r"
            UPDATE admin.store
            SET name = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING id, name, user_id, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(id)
        .bind(user_id.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a store owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user owns no such store.
    /// Returns `RepositoryError::Conflict` while catalog records still reference it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: StoreId, user_id: &UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM admin.store
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, IN_USE))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count the catalog records of a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self, id: StoreId) -> Result<StoreCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, StoreCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM admin.billboard WHERE store_id = $1) AS "billboards",
                (SELECT COUNT(*) FROM admin.category WHERE store_id = $1) AS "categories",
                (SELECT COUNT(*) FROM admin.size WHERE store_id = $1) AS "sizes",
                (SELECT COUNT(*) FROM admin.color WHERE store_id = $1) AS "colors",
                (SELECT COUNT(*) FROM admin.product WHERE store_id = $1) AS "products",
                (SELECT COUNT(*) FROM admin.product
                    WHERE store_id = $1 AND is_featured AND NOT is_archived) AS "featured_products",
                (SELECT COUNT(*) FROM admin.product
                    WHERE store_id = $1 AND is_archived) AS "archived_products"
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}
