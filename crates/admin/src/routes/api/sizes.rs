//! Size endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use storekeep_core::{SizeId, StoreId};

use crate::db::SizeRepository;
use crate::error::{AppError, ResultExt};
use crate::forms::SizeForm;
use crate::middleware::RequireUser;
use crate::models::Size;
use crate::services::require_store_owner;
use crate::state::AppState;

use super::invalid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/sizes", get(list).post(create))
        .route(
            "/{store_id}/sizes/{size_id}",
            get(show).put(update).patch(update).delete(destroy),
        )
}

/// GET /api/{store_id}/sizes
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Size>>, AppError> {
    let sizes = SizeRepository::new(state.pool())
        .list_for_store(store_id)
        .await
        .context("SIZES_GET")?;
    Ok(Json(sizes))
}

/// POST /api/{store_id}/sizes
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<SizeForm>,
) -> Result<Json<Size>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("SIZES_POST")?;

    let size = SizeRepository::new(state.pool())
        .create(store_id, &input)
        .await
        .context("SIZES_POST")?;
    Ok(Json(size))
}

/// GET /api/{store_id}/sizes/{size_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_id, size_id)): Path<(StoreId, SizeId)>,
) -> Result<Json<Size>, AppError> {
    SizeRepository::new(state.pool())
        .get(store_id, size_id)
        .await
        .context("SIZE_GET")?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Size not found".to_owned()))
}

/// PUT|PATCH /api/{store_id}/sizes/{size_id}
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, size_id)): Path<(StoreId, SizeId)>,
    Json(form): Json<SizeForm>,
) -> Result<Json<Size>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("SIZE_PATCH")?;

    let size = SizeRepository::new(state.pool())
        .update(store_id, size_id, &input)
        .await
        .context("SIZE_PATCH")?;
    Ok(Json(size))
}

/// DELETE /api/{store_id}/sizes/{size_id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, size_id)): Path<(StoreId, SizeId)>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("SIZE_DELETE")?;

    SizeRepository::new(state.pool())
        .delete(store_id, size_id)
        .await
        .context("SIZE_DELETE")?;
    Ok((StatusCode::OK, "Size deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{assert_response, bearer, send};
    use crate::state::tests::test_state;

    const STORE: &str = "0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61";
    const SIZE: &str = "6a1c8d2e-4f3b-4e9a-8c7d-1b2a3c4d5e6f";

    #[tokio::test]
    async fn test_create_requires_caller() {
        let state = test_state();
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/sizes"),
            None,
            Some(json!({ "name": "Small", "value": "S" })),
        )
        .await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
    }

    #[tokio::test]
    async fn test_create_validates_before_ownership() {
        let state = test_state();
        let auth = bearer(&state);

        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/sizes"),
            Some(&auth),
            Some(json!({ "value": "S" })),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Name is required").await;

        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/sizes"),
            Some(&auth),
            Some(json!({ "name": "Small", "value": "" })),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Value is required").await;
    }

    #[tokio::test]
    async fn test_patch_and_put_share_validation() {
        let state = test_state();
        let auth = bearer(&state);

        for method in ["PUT", "PATCH"] {
            let response = send(
                &state,
                method,
                &format!("/api/{STORE}/sizes/{SIZE}"),
                Some(&auth),
                Some(json!({ "name": "  " })),
            )
            .await;
            assert_response(response, StatusCode::BAD_REQUEST, "Name is required").await;
        }
    }

    #[tokio::test]
    async fn test_delete_requires_caller() {
        let state = test_state();
        let uri = format!("/api/{STORE}/sizes/{SIZE}");
        let response = send(&state, "DELETE", &uri, None, None).await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected() {
        let state = test_state();
        let response = send(&state, "GET", "/api/not-a-store/sizes", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&state, "GET", &format!("/api/{STORE}/sizes/42"), None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
