//! Product endpoints.
//!
//! The public listing hides archived products and accepts `categoryId`,
//! `colorId`, `sizeId` and `isFeatured` filters. The category, size and
//! color of a product must belong to the same store.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use storekeep_core::{CategoryId, ColorId, ProductId, SizeId, StoreId};

use crate::db::{CategoryRepository, ColorRepository, ProductRepository, SizeRepository};
use crate::error::{AppError, ResultExt};
use crate::forms::ProductForm;
use crate::middleware::RequireUser;
use crate::models::{Product, ProductFilter, ProductInput};
use crate::services::require_store_owner;
use crate::state::AppState;

use super::{invalid, not_in_store};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/products", get(list).post(create))
        .route(
            "/{store_id}/products/{product_id}",
            get(show).put(update).patch(update).delete(destroy),
        )
}

/// Query string of the public listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub color_id: Option<ColorId>,
    pub size_id: Option<SizeId>,
    pub is_featured: Option<bool>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            category_id: query.category_id,
            size_id: query.size_id,
            color_id: query.color_id,
            is_featured: query.is_featured,
        }
    }
}

/// Referenced records must be part of the addressed store.
async fn check_references(
    state: &AppState,
    store_id: StoreId,
    input: &ProductInput,
) -> Result<(), AppError> {
    let pool = state.pool();
    if !CategoryRepository::new(pool)
        .exists_in_store(store_id, input.category_id)
        .await?
    {
        return Err(not_in_store("Category"));
    }
    if !SizeRepository::new(pool)
        .exists_in_store(store_id, input.size_id)
        .await?
    {
        return Err(not_in_store("Size"));
    }
    if !ColorRepository::new(pool)
        .exists_in_store(store_id, input.color_id)
        .await?
    {
        return Err(not_in_store("Color"));
    }
    Ok(())
}

/// GET /api/{store_id}/products
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool())
        .list_public(store_id, query.into())
        .await
        .context("PRODUCTS_GET")?;
    Ok(Json(products))
}

/// POST /api/{store_id}/products
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, AppError> {
    let input = form
        .validate(|url| state.accepts_image_url(url))
        .map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("PRODUCTS_POST")?;
    check_references(&state, store_id, &input)
        .await
        .context("PRODUCTS_POST")?;

    let product = ProductRepository::new(state.pool())
        .create(store_id, &input)
        .await
        .context("PRODUCTS_POST")?;
    Ok(Json(product))
}

/// GET /api/{store_id}/products/{product_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
) -> Result<Json<Product>, AppError> {
    ProductRepository::new(state.pool())
        .get(store_id, product_id)
        .await
        .context("PRODUCT_GET")?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

/// PUT|PATCH /api/{store_id}/products/{product_id}
///
/// The submitted images replace the stored set.
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>, AppError> {
    let input = form
        .validate(|url| state.accepts_image_url(url))
        .map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("PRODUCT_PATCH")?;
    check_references(&state, store_id, &input)
        .await
        .context("PRODUCT_PATCH")?;

    let product = ProductRepository::new(state.pool())
        .update(store_id, product_id, &input)
        .await
        .context("PRODUCT_PATCH")?;
    Ok(Json(product))
}

/// DELETE /api/{store_id}/products/{product_id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(StoreId, ProductId)>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("PRODUCT_DELETE")?;

    ProductRepository::new(state.pool())
        .delete(store_id, product_id)
        .await
        .context("PRODUCT_DELETE")?;
    Ok((StatusCode::OK, "Product deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{assert_response, bearer, send};
    use super::*;
    use crate::state::tests::test_state;

    const STORE: &str = "0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61";

    #[test]
    fn test_query_parses_filters() {
        let category = CategoryId::generate();
        let query: ProductQuery = serde_json::from_value(json!({
            "categoryId": category.to_string(),
            "isFeatured": true,
        }))
        .expect("query");
        let filter = ProductFilter::from(query);
        assert_eq!(filter.category_id, Some(category));
        assert_eq!(filter.is_featured, Some(true));
        assert_eq!(filter.size_id, None);
        assert_eq!(filter.color_id, None);
    }

    #[tokio::test]
    async fn test_bad_filter_is_rejected() {
        let state = test_state();
        let response = send(
            &state,
            "GET",
            &format!("/api/{STORE}/products?categoryId=shirts"),
            None,
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_checks_images_after_name() {
        let state = test_state();
        let auth = bearer(&state);

        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/products"),
            Some(&auth),
            Some(json!({ "price": 10 })),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Name is required").await;

        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/products"),
            Some(&auth),
            Some(json!({ "name": "Tee", "price": 10, "images": [] })),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Images are required").await;
    }

    #[tokio::test]
    async fn test_create_requires_caller() {
        let state = test_state();
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/products"),
            None,
            Some(json!({ "name": "Tee" })),
        )
        .await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
    }
}
