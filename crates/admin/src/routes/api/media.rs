//! Signed direct uploads for the image widget.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use tracing::instrument;

use storekeep_core::StoreId;

use crate::error::{AppError, ResultExt};
use crate::middleware::RequireUser;
use crate::services::{UploadSignature, require_store_owner};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{store_id}/media/signature", post(signature))
}

/// POST /api/{store_id}/media/signature
///
/// Returns the parameters the browser posts to the media service alongside
/// the file. 404 when uploads are not configured.
#[instrument(skip(user, state), fields(user_id = %user.id))]
async fn signature(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<UploadSignature>, AppError> {
    let Some(signer) = state.media() else {
        return Err(AppError::NotFound(
            "Media uploads are not configured".to_owned(),
        ));
    };
    require_store_owner(state.pool(), store_id, &user.id)
        .await
        .context("MEDIA_SIGNATURE")?;

    Ok(Json(signer.sign_upload(chrono::Utc::now().timestamp())))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::tests::{assert_response, send};
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn test_signature_requires_caller() {
        let state = test_state();
        let response = send(
            &state,
            "POST",
            "/api/0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61/media/signature",
            None,
            None,
        )
        .await;
        assert_response(response, StatusCode::UNAUTHORIZED, "Unauthenticated").await;
    }
}
