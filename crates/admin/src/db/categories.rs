//! Category repository for database operations.
//!
//! Category reads join the linked billboard so list pages and the public API
//! can show its label without a second query.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use storekeep_core::{BillboardId, CategoryId, StoreId};

use super::RepositoryError;
use crate::models::{Category, CategoryInput};

/// Conflict message when a delete is blocked by referencing records.
pub const IN_USE: &str = "Make sure you removed all products using this category first.";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    store_id: Uuid,
    billboard_id: Uuid,
    billboard_label: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            store_id: StoreId::new(row.store_id),
            billboard_id: BillboardId::new(row.billboard_id),
            billboard_label: row.billboard_label,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories of a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.store_id, c.billboard_id, b.label AS billboard_label,
                   c.name, c.created_at, c.updated_at
            FROM admin.category c
            JOIN admin.billboard b ON b.id = c.billboard_id
            WHERE c.store_id = $1
            ORDER BY c.created_at DESC
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by id within a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: CategoryId,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.store_id, c.billboard_id, b.label AS billboard_label,
                   c.name, c.created_at, c.updated_at
            FROM admin.category c
            JOIN admin.billboard b ON b.id = c.billboard_id
            WHERE c.id = $1 AND c.store_id = $2
            ",
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a category.
    ///
    /// The billboard must already have been checked to belong to `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the billboard no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            WITH inserted AS (
                INSERT INTO admin.category (store_id, billboard_id, name)
                VALUES ($1, $2, $3)
                RETURNING id, store_id, billboard_id, name, created_at, updated_at
            )
            SELECT i.id, i.store_id, i.billboard_id, b.label AS billboard_label,
                   i.name, i.created_at, i.updated_at
            FROM inserted i
            JOIN admin.billboard b ON b.id = i.billboard_id
            ",
        )
        .bind(store_id)
        .bind(input.billboard_id)
        .bind(&input.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "billboard does not exist"))?;

        Ok(row.into())
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category is not in this store.
    /// Returns `RepositoryError::Conflict` if the billboard no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            WITH updated AS (
                UPDATE admin.category
                SET name = $1, billboard_id = $2, updated_at = NOW()
                WHERE id = $3 AND store_id = $4
                RETURNING id, store_id, billboard_id, name, created_at, updated_at
            )
            SELECT u.id, u.store_id, u.billboard_id, b.label AS billboard_label,
                   u.name, u.created_at, u.updated_at
            FROM updated u
            JOIN admin.billboard b ON b.id = u.billboard_id
            ",
        )
        .bind(&input.name)
        .bind(input.billboard_id)
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "billboard does not exist"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category is not in this store.
    /// Returns `RepositoryError::Conflict` if products still use the category.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, store_id: StoreId, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM admin.category
            WHERE id = $1 AND store_id = $2
            ",
        )
        .bind(id)
        .bind(store_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, IN_USE))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Whether a category id exists in the given store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_in_store(
        &self,
        store_id: StoreId,
        id: CategoryId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admin.category WHERE id = $1 AND store_id = $2)",
        )
        .bind(id)
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
