//! Store endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use tracing::instrument;

use storekeep_core::StoreId;

use crate::db::StoreRepository;
use crate::error::{AppError, ResultExt};
use crate::forms::StoreForm;
use crate::middleware::RequireUser;
use crate::models::Store;
use crate::services::require_store_owner;
use crate::state::AppState;

use super::invalid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stores", post(create))
        .route("/stores/{store_id}", patch(rename).delete(destroy))
}

/// POST /api/stores
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(form): Json<StoreForm>,
) -> Result<Json<Store>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    let store = StoreRepository::new(state.pool())
        .create(&user.id, &input)
        .await
        .context("STORES_POST")?;
    tracing::info!(store_id = %store.id, "Store created");
    Ok(Json(store))
}

/// PATCH /api/stores/{store_id}
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn rename(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<StoreForm>,
) -> Result<Json<Store>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("STORE_PATCH")?;

    let store = StoreRepository::new(state.pool())
        .rename(store_id, &user.id, &input)
        .await
        .context("STORE_PATCH")?;
    Ok(Json(store))
}

/// DELETE /api/stores/{store_id}
///
/// Refused with 409 while the store still has catalog records.
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("STORE_DELETE")?;

    StoreRepository::new(state.pool())
        .delete(store_id, &user.id)
        .await
        .context("STORE_DELETE")?;
    tracing::info!(%store_id, "Store deleted");
    Ok((StatusCode::OK, "Store deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{assert_response, bearer, send};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_create_store_rules() {
        let state = test_state();

        let response = send(
            &state,
            "POST",
            "/api/stores",
            None,
            Some(json!({ "name": "Shoes" })),
        )
        .await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;

        let auth = bearer(&state);
        let response = send(
            &state,
            "POST",
            "/api/stores",
            Some(&auth),
            Some(json!({ "name": " " })),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Name is required").await;
    }

    #[tokio::test]
    async fn test_rename_validates_name() {
        let state = test_state();
        let auth = bearer(&state);
        let response = send(
            &state,
            "PATCH",
            "/api/stores/0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61",
            Some(&auth),
            Some(json!({})),
        )
        .await;
        assert_response(response, StatusCode::BAD_REQUEST, "Name is required").await;
    }
}
