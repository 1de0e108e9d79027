//! Color repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use storekeep_core::{ColorId, StoreId};

use super::RepositoryError;
use crate::models::{Color, ColorInput};

/// Conflict message when a delete is blocked by referencing records.
pub const IN_USE: &str = "Make sure you removed all products using this color first.";

#[derive(Debug, sqlx::FromRow)]
struct ColorRow {
    id: Uuid,
    store_id: Uuid,
    name: String,
    value: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ColorRow> for Color {
    fn from(row: ColorRow) -> Self {
        Self {
            id: ColorId::new(row.id),
            store_id: StoreId::new(row.store_id),
            name: row.name,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for color database operations.
pub struct ColorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ColorRepository<'a> {
    /// Create a new color repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all colors of a store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(&self, store_id: StoreId) -> Result<Vec<Color>, RepositoryError> {
        let rows = sqlx::query_as::<_, ColorRow>(
            r"
            SELECT id, store_id, name, value, created_at, updated_at
            FROM admin.color
            WHERE store_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a color by id within a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: ColorId,
    ) -> Result<Option<Color>, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            r"
            SELECT id, store_id, name, value, created_at, updated_at
            FROM admin.color
            WHERE id = $1 AND store_id = $2
            ",
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ColorInput,
    ) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            r"
            INSERT INTO admin.color (store_id, name, value)
            VALUES ($1, $2, $3)
            RETURNING id, store_id, name, value, created_at, updated_at
            ",
        )
        .bind(store_id)
        .bind(&input.name)
        .bind(input.value.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Update a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color is not in this store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ColorId,
        input: &ColorInput,
    ) -> Result<Color, RepositoryError> {
        let row = sqlx::query_as::<_, ColorRow>(
            r"
            UPDATE admin.color
            SET name = $1, value = $2, updated_at = NOW()
            WHERE id = $3 AND store_id = $4
            RETURNING id, store_id, name, value, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.value.as_str())
        .bind(id)
        .bind(store_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the color is not in this store.
    /// Returns `RepositoryError::Conflict` if products still use the color.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, store_id: StoreId, id: ColorId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM admin.color
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

    /// Whether a color id exists in the given store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_in_store(
        &self,
        store_id: StoreId,
        id: ColorId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM admin.color WHERE id = $1 AND store_id = $2)",
        )
        .bind(id)
        .bind(store_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
