//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready          - Liveness / readiness
//!
//! # Auth (hosted identity provider)
//! GET  /sign-in                        - Redirect to the provider
//! GET  /auth/callback                  - Provider redirect back
//! POST /sign-out                       - End the dashboard session
//!
//! # Stores
//! GET  /                               - First store, or the create-store form
//! GET  /stores                         - Create-store form
//! POST /stores                         - Create a store
//! GET  /{store_id}                     - Overview
//! GET  /{store_id}/settings            - Rename / delete
//! POST /{store_id}/settings
//! POST /{store_id}/settings/delete
//!
//! # Catalog (billboards, categories, sizes, colors, products)
//! GET  /{store_id}/{entity}            - Table and API endpoints
//! GET  /{store_id}/{entity}/new        - Create form
//! GET  /{store_id}/{entity}/{id}       - Edit form
//! POST /{store_id}/{entity}/new        - Create
//! POST /{store_id}/{entity}/{id}       - Update
//! POST /{store_id}/{entity}/{id}/delete
//!
//! # JSON API
//! /api/...                             - See [`api`]
//! ```

pub mod api;
pub mod auth;
pub mod billboards;
pub mod categories;
pub mod colors;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod layout;
pub mod products;
pub mod settings;
pub mod sizes;

use axum::Router;

use crate::state::AppState;

/// Build the complete router (pages, API and probes).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(home::router())
        .merge(dashboard::router())
        .merge(settings::router())
        .merge(billboards::router())
        .merge(categories::router())
        .merge(sizes::router())
        .merge(colors::router())
        .merge(products::router())
        .nest("/api", api::router())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use super::*;
    use crate::state::tests::test_state;

    fn app() -> Router {
        routes()
            .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
            .with_state(test_state())
    }

    async fn get(uri: &str) -> axum::response::Response {
        app()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn test_pages_redirect_anonymous_users_to_sign_in() {
        for uri in [
            "/",
            "/stores",
            "/0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61",
            "/0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61/sizes",
            "/0b7f6f0e-2b55-4c8e-9a57-3f1d2a4c5e61/products/new",
        ] {
            let response = get(uri).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(
                response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
                Some("/sign-in"),
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_api_answers_anonymous_writes_with_401() {
        let response = app()
            .oneshot(
                Request::post("/api/stores")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name":"Shoes"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_route_is_mounted() {
        assert_eq!(get("/health").await.status(), StatusCode::OK);
    }
}
