//! Category endpoints.
//!
//! A category's billboard must belong to the same store.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use storekeep_core::{CategoryId, StoreId};

use crate::db::{BillboardRepository, CategoryRepository};
use crate::error::{AppError, ResultExt};
use crate::forms::CategoryForm;
use crate::middleware::RequireUser;
use crate::models::{Category, CategoryInput};
use crate::services::require_store_owner;
use crate::state::AppState;

use super::{invalid, not_in_store};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/categories", get(list).post(create))
        .route(
            "/{store_id}/categories/{category_id}",
            get(show).put(update).patch(update).delete(destroy),
        )
}

async fn check_billboard(
    state: &AppState,
    store_id: StoreId,
    input: &CategoryInput,
) -> Result<(), AppError> {
    if BillboardRepository::new(state.pool())
        .exists_in_store(store_id, input.billboard_id)
        .await?
    {
        Ok(())
    } else {
        Err(not_in_store("Billboard"))
    }
}

/// GET /api/{store_id}/categories
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list_for_store(store_id)
        .await
        .context("CATEGORIES_GET")?;
    Ok(Json(categories))
}

/// POST /api/{store_id}/categories
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("CATEGORIES_POST")?;
    check_billboard(&state, store_id, &input)
        .await
        .context("CATEGORIES_POST")?;

    let category = CategoryRepository::new(state.pool())
        .create(store_id, &input)
        .await
        .context("CATEGORIES_POST")?;
    Ok(Json(category))
}

/// GET /api/{store_id}/categories/{category_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(StoreId, CategoryId)>,
) -> Result<Json<Category>, AppError> {
    CategoryRepository::new(state.pool())
        .get(store_id, category_id)
        .await
        .context("CATEGORY_GET")?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))
}

/// PUT|PATCH /api/{store_id}/categories/{category_id}
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(StoreId, CategoryId)>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("CATEGORY_PATCH")?;
    check_billboard(&state, store_id, &input)
        .await
        .context("CATEGORY_PATCH")?;

    let category = CategoryRepository::new(state.pool())
        .update(store_id, category_id, &input)
        .await
        .context("CATEGORY_PATCH")?;
    Ok(Json(category))
}

/// DELETE /api/{store_id}/categories/{category_id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(StoreId, CategoryId)>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("CATEGORY_DELETE")?;

    CategoryRepository::new(state.pool())
        .delete(store_id, category_id)
        .await
        .context("CATEGORY_DELETE")?;
    Ok((StatusCode::OK, "Category deleted successfully"))
}
