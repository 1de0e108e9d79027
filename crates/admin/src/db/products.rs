//! Product repository for database operations.
//!
//! Products join their category, size and color for display, and own a set of
//! image rows. Image rows are always written in the same transaction as the
//! product row; an update replaces the whole image set.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use storekeep_core::{CategoryId, ColorId, ImageId, ProductId, SizeId, StoreId};

use super::RepositoryError;
use crate::models::{Product, ProductFilter, ProductImage, ProductInput, Swatch};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    store_id: Uuid,
    category_id: Uuid,
    size_id: Uuid,
    color_id: Uuid,
    name: String,
    price: Decimal,
    is_featured: bool,
    is_archived: bool,
    category_name: String,
    size_name: String,
    size_value: String,
    color_name: String,
    color_value: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<ProductImage>) -> Product {
        Product {
            id: ProductId::new(self.id),
            store_id: StoreId::new(self.store_id),
            category_id: CategoryId::new(self.category_id),
            size_id: SizeId::new(self.size_id),
            color_id: ColorId::new(self.color_id),
            name: self.name,
            price: self.price,
            is_featured: self.is_featured,
            is_archived: self.is_archived,
            category_name: self.category_name,
            size: Swatch {
                name: self.size_name,
                value: self.size_value,
            },
            color: Swatch {
                name: self.color_name,
                value: self.color_value,
            },
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    product_id: Uuid,
    url: String,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: ImageId::new(row.id),
            product_id: ProductId::new(row.product_id),
            url: row.url,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.store_id, p.category_id, p.size_id, p.color_id,
           p.name, p.price, p.is_featured, p.is_archived,
           c.name AS category_name,
           s.name AS size_name, s.value AS size_value,
           co.name AS color_name, co.value AS color_value,
           p.created_at, p.updated_at
    FROM admin.product p
    JOIN admin.category c ON c.id = p.category_id
    JOIN admin.size s ON s.id = p.size_id
    JOIN admin.color co ON co.id = p.color_id
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products of a store (archived included), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.store_id = $1 ORDER BY p.created_at DESC");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .fetch_all(self.pool)
            .await?;

        self.attach_images(rows).await
    }

    /// List the products a storefront may show: never archived, optionally
    /// narrowed by category, size, color and the featured flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_public(
        &self,
        store_id: StoreId,
        filter: ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT}
            WHERE p.store_id = $1
              AND NOT p.is_archived
              AND ($2::uuid IS NULL OR p.category_id = $2)
              AND ($3::uuid IS NULL OR p.size_id = $3)
              AND ($4::uuid IS NULL OR p.color_id = $4)
              AND ($5::bool IS NULL OR p.is_featured = $5)
            ORDER BY p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(store_id)
            .bind(filter.category_id)
            .bind(filter.size_id)
            .bind(filter.color_id)
            .bind(filter.is_featured)
            .fetch_all(self.pool)
            .await?;

        self.attach_images(rows).await
    }

    /// Get a product with its images by id within a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(
        &self,
        store_id: StoreId,
        id: ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1 AND p.store_id = $2");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(store_id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_images(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Create a product and its images.
    ///
    /// Category, size and color must already have been checked to belong to
    /// `store_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a referenced record disappeared.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO admin.product
                (store_id, category_id, size_id, color_id, name, price, is_featured, is_archived)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(input.category_id)
        .bind(input.size_id)
        .bind(input.color_id)
        .bind(&input.name)
        .bind(input.price.amount())
        .bind(input.is_featured)
        .bind(input.is_archived)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category, size or color does not exist"))?;

        let product_id = ProductId::new(id);
        insert_images(&mut tx, product_id, &input.image_urls).await?;
        tx.commit().await?;

        self.get(store_id, product_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a product and replace its image set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in this store.
    /// Returns `RepositoryError::Conflict` if a referenced record disappeared.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        store_id: StoreId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE admin.product
            SET name = $1, price = $2, category_id = $3, size_id = $4, color_id = $5,
                is_featured = $6, is_archived = $7, updated_at = NOW()
            WHERE id = $8 AND store_id = $9
            ",
        )
        .bind(&input.name)
        .bind(input.price.amount())
        .bind(input.category_id)
        .bind(input.size_id)
        .bind(input.color_id)
        .bind(input.is_featured)
        .bind(input.is_archived)
        .bind(id)
        .bind(store_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "category, size or color does not exist"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM admin.image WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_images(&mut tx, id, &input.image_urls).await?;
        tx.commit().await?;

        self.get(store_id, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product; its images go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in this store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, store_id: StoreId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM admin.product
            WHERE id = $1 AND store_id = $2
            ",
        )
        .bind(id)
        .bind(store_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let images = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, product_id, url, created_at
            FROM admin.image
            WHERE product_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_product: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
        for image in images {
            by_product
                .entry(image.product_id)
                .or_default()
                .push(image.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(images)
            })
            .collect())
    }
}

/// Insert image rows in upload order.
async fn insert_images(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    urls: &[String],
) -> Result<(), RepositoryError> {
    if urls.is_empty() {
        return Ok(());
    }

    // unnest WITH ORDINALITY keeps the list order in created_at ties
    sqlx::query(
        r"
        INSERT INTO admin.image (product_id, url, created_at)
        SELECT $1, u.url, NOW() + (u.ord * INTERVAL '1 microsecond')
        FROM unnest($2::text[]) WITH ORDINALITY AS u(url, ord)
        ",
    )
    .bind(product_id)
    .bind(urls)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
