//! Billboard endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use storekeep_core::{BillboardId, StoreId};

use crate::db::BillboardRepository;
use crate::error::{AppError, ResultExt};
use crate::forms::BillboardForm;
use crate::middleware::RequireUser;
use crate::models::Billboard;
use crate::services::require_store_owner;
use crate::state::AppState;

use super::invalid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/billboards", get(list).post(create))
        .route(
            "/{store_id}/billboards/{billboard_id}",
            get(show).put(update).patch(update).delete(destroy),
        )
}

/// GET /api/{store_id}/billboards
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Billboard>>, AppError> {
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(store_id)
        .await
        .context("BILLBOARDS_GET")?;
    Ok(Json(billboards))
}

/// POST /api/{store_id}/billboards
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<BillboardForm>,
) -> Result<Json<Billboard>, AppError> {
    let input = form
        .validate(|url| state.accepts_image_url(url))
        .map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("BILLBOARDS_POST")?;

    let billboard = BillboardRepository::new(state.pool())
        .create(store_id, &input)
        .await
        .context("BILLBOARDS_POST")?;
    Ok(Json(billboard))
}

/// GET /api/{store_id}/billboards/{billboard_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_id, billboard_id)): Path<(StoreId, BillboardId)>,
) -> Result<Json<Billboard>, AppError> {
    BillboardRepository::new(state.pool())
        .get(store_id, billboard_id)
        .await
        .context("BILLBOARD_GET")?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Billboard not found".to_owned()))
}

/// PUT|PATCH /api/{store_id}/billboards/{billboard_id}
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, billboard_id)): Path<(StoreId, BillboardId)>,
    Json(form): Json<BillboardForm>,
) -> Result<Json<Billboard>, AppError> {
    let input = form
        .validate(|url| state.accepts_image_url(url))
        .map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("BILLBOARD_PATCH")?;

    let billboard = BillboardRepository::new(state.pool())
        .update(store_id, billboard_id, &input)
        .await
        .context("BILLBOARD_PATCH")?;
    Ok(Json(billboard))
}

/// DELETE /api/{store_id}/billboards/{billboard_id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, billboard_id)): Path<(StoreId, BillboardId)>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("BILLBOARD_DELETE")?;

    BillboardRepository::new(state.pool())
        .delete(store_id, billboard_id)
        .await
        .context("BILLBOARD_DELETE")?;
    Ok((StatusCode::OK, "Billboard deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{assert_response, bearer, send};
    use crate::state::tests::test_state;

    const STORE: &str = "0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61";

    #[tokio::test]
    async fn test_label_required_first() {
        let state = test_state();
        let auth = bearer(&state);
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/billboards"),
            Some(&auth),
            Some(json!({})),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Label is required").await;
    }

    #[tokio::test]
    async fn test_image_must_come_from_configured_cloud() {
        let state = test_state();
        let auth = bearer(&state);
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/billboards"),
            Some(&auth),
            Some(json!({ "label": "Summer", "imageUrl": "https://elsewhere.example/a.png" })),
        )
        .await;
        assert_response(
            response,
            StatusCode::BAD_REQUEST,
            "Image URL must be an uploaded https image",
        )
        .await;
    }
}
