//! JSON REST API.
//!
//! Storefronts read catalog data through the public `GET` endpoints. Every
//! other endpoint requires a signed-in caller and checks that the caller owns
//! the addressed store. Handlers run their checks in a fixed order:
//!
//! 1. no caller → 401 `Unauthenticated`
//! 2. invalid body → 400 with the first field message
//! 3. caller does not own the store → 403 `Unauthorized`
//! 4. database call; unexpected failures are logged under the handler's tag
//!    and answered with 500 `Internal error`
//!
//! ```text
//! POST   /api/stores
//! PATCH  /api/stores/{store_id}
//! DELETE /api/stores/{store_id}
//! GET    /api/{store_id}/{entity}
//! POST   /api/{store_id}/{entity}
//! GET    /api/{store_id}/{entity}/{id}
//! PUT    /api/{store_id}/{entity}/{id}      (PATCH is accepted too)
//! DELETE /api/{store_id}/{entity}/{id}
//! POST   /api/{store_id}/media/signature
//! ```

pub mod billboards;
pub mod categories;
pub mod colors;
pub mod media;
pub mod products;
pub mod sizes;
pub mod stores;

use axum::Router;

use crate::error::AppError;
use crate::forms::FieldErrors;
use crate::state::AppState;

/// Build the API router (mounted under `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(stores::router())
        .merge(billboards::router())
        .merge(categories::router())
        .merge(sizes::router())
        .merge(colors::router())
        .merge(products::router())
        .merge(media::router())
}

/// 400 carrying the first failing field's message.
pub(crate) fn invalid(errors: &FieldErrors) -> AppError {
    AppError::BadRequest(errors.first().unwrap_or("Invalid request").to_owned())
}

/// 400 for a referenced id that is not part of the addressed store.
pub(crate) fn not_in_store(entity: &str) -> AppError {
    AppError::BadRequest(format!("{entity} not found in this store"))
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use tower::ServiceExt;

    use crate::services::SessionClaims;
    use crate::state::AppState;

    /// A bearer token for `user_test` signed with the test secret.
    pub(crate) fn bearer(state: &AppState) -> String {
        let now = chrono::Utc::now().timestamp();
        let token = state
            .identity()
            .issue(&SessionClaims::new("user_test", now, 300))
            .expect("issue token");
        format!("Bearer {token}")
    }

    /// Send one request through the API router.
    pub(crate) async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        axum::Router::new()
            .nest("/api", super::router())
            .with_state(state.clone())
            .oneshot(request.body(body).expect("request"))
            .await
            .expect("response")
    }

    /// Response body as text.
    pub(crate) async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    pub(crate) async fn assert_response(response: Response, status: StatusCode, body: &str) {
        assert_eq!(response.status(), status);
        assert_eq!(text(response).await, body);
    }

    #[test]
    fn test_invalid_uses_first_message() {
        let err = crate::forms::SizeForm::default()
            .validate()
            .expect_err("empty form");
        assert_eq!(super::invalid(&err).client_message(), "Name is required");
        assert_eq!(
            super::not_in_store("Billboard").client_message(),
            "Billboard not found in this store"
        );
    }
}
