//! Color endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use storekeep_core::{ColorId, StoreId};

use crate::db::ColorRepository;
use crate::error::{AppError, ResultExt};
use crate::forms::ColorForm;
use crate::middleware::RequireUser;
use crate::models::Color;
use crate::services::require_store_owner;
use crate::state::AppState;

use super::invalid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/colors", get(list).post(create))
        .route(
            "/{store_id}/colors/{color_id}",
            get(show).put(update).patch(update).delete(destroy),
        )
}

/// GET /api/{store_id}/colors
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<Color>>, AppError> {
    let colors = ColorRepository::new(state.pool())
        .list_for_store(store_id)
        .await
        .context("COLORS_GET")?;
    Ok(Json(colors))
}

/// POST /api/{store_id}/colors
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
    Json(form): Json<ColorForm>,
) -> Result<Json<Color>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("COLORS_POST")?;

    let color = ColorRepository::new(state.pool())
        .create(store_id, &input)
        .await
        .context("COLORS_POST")?;
    Ok(Json(color))
}

/// GET /api/{store_id}/colors/{color_id}
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path((store_id, color_id)): Path<(StoreId, ColorId)>,
) -> Result<Json<Color>, AppError> {
    ColorRepository::new(state.pool())
        .get(store_id, color_id)
        .await
        .context("COLOR_GET")?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Color not found".to_owned()))
}

/// PUT|PATCH /api/{store_id}/colors/{color_id}
#[instrument(skip(user, state, form), fields(user_id = %user.id))]
async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, color_id)): Path<(StoreId, ColorId)>,
    Json(form): Json<ColorForm>,
) -> Result<Json<Color>, AppError> {
    let input = form.validate().map_err(|e| invalid(&e))?;
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("COLOR_PATCH")?;

    let color = ColorRepository::new(state.pool())
        .update(store_id, color_id, &input)
        .await
        .context("COLOR_PATCH")?;
    Ok(Json(color))
}

/// DELETE /api/{store_id}/colors/{color_id}
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn destroy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path((store_id, color_id)): Path<(StoreId, ColorId)>,
) -> Result<impl IntoResponse, AppError> {
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("COLOR_DELETE")?;

    ColorRepository::new(state.pool())
        .delete(store_id, color_id)
        .await
        .context("COLOR_DELETE")?;
    Ok((StatusCode::OK, "Color deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{assert_response, bearer, send};
    use crate::state::tests::test_state;

    const STORE: &str = "0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61";

    #[tokio::test]
    async fn test_color_value_must_be_hex() {
        let state = test_state();
        let auth = bearer(&state);
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/colors"),
            Some(&auth),
            Some(json!({ "name": "Red", "value": "red" })),
        )
        .await;
        assert_response(
            response,
            StatusCode::BAD_REQUEST,
            "Value must be a valid hex color",
        )
        .await;
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthenticated() {
        let state = test_state();
        let response = send(
            &state,
            "POST",
            &format!("/api/{STORE}/colors"),
            Some("Bearer not.a.token"),
            Some(json!({ "name": "Red", "value": "#f00" })),
        )
        .await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
    }
}
