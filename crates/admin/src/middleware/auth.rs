//! Authentication extractors.
//!
//! The caller is resolved in this order:
//!
//! 1. `Authorization: Bearer <token>` (API clients)
//! 2. the identity provider's `__session` cookie (same-site deployments)
//! 3. the [`CurrentUser`] stored in the dashboard session at sign-in
//!
//! Tokens are verified with [`IdentityVerifier`](crate::services::IdentityVerifier);
//! an invalid token is treated the same as no token.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tower_sessions::cookie::Cookie;

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};
use crate::services::SessionClaims;
use crate::state::AppState;

/// Name of the identity provider's session cookie.
pub const IDENTITY_COOKIE_NAME: &str = "__session";

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, API requests get 401 `Unauthenticated` and page
/// requests are redirected to `/sign-in`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Error returned when a signed-in user is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to sign-in (for HTML requests).
    RedirectToSignIn,
    /// 401 response (for API requests).
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => Redirect::to("/sign-in").into_response(),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthenticated").into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, state).await {
            Some(user) => {
                set_sentry_user(user.id.as_str(), user.email.as_deref());
                Ok(Self(user))
            }
            None if is_api_request(parts) => Err(AuthRejection::Unauthenticated),
            None => Err(AuthRejection::RedirectToSignIn),
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireUser`, this never rejects the request.
pub struct OptionalUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_user(parts, state).await))
    }
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
    if let Some(token) = bearer_token(&parts.headers).or_else(|| identity_cookie(&parts.headers)) {
        match state.identity().verify(&token).and_then(SessionClaims::into_user) {
            Ok(user) => return Some(user),
            Err(e) => tracing::debug!(error = %e, "Rejected identity token"),
        }
    }

    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Nested routers see a stripped URI, so prefer the original one.
fn is_api_request(parts: &Parts) -> bool {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or(parts.uri.path(), |original| original.0.path())
        .starts_with("/api/")
}

/// Token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

/// Token from the identity provider's `__session` cookie.
fn identity_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == IDENTITY_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to end the dashboard session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).expect("header value"));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(
            bearer_token(&headers(header::AUTHORIZATION, "Bearer abc.def.ghi")),
            Some("abc.def.ghi".to_owned())
        );
        assert_eq!(
            bearer_token(&headers(header::AUTHORIZATION, "bearer  tok ")),
            Some("tok".to_owned())
        );
        assert_eq!(bearer_token(&headers(header::AUTHORIZATION, "Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers(header::AUTHORIZATION, "Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_identity_cookie() {
        assert_eq!(
            identity_cookie(&headers(header::COOKIE, "theme=dark; __session=tok123; x=y")),
            Some("tok123".to_owned())
        );
        assert_eq!(
            identity_cookie(&headers(header::COOKIE, "storekeep_session=abc")),
            None
        );
        assert_eq!(identity_cookie(&headers(header::COOKIE, "__session=")), None);
    }

    mod session_fallback {
        use axum::{Router, body::Body, http::Request, routing::get};
        use storekeep_core::UserId;
        use tower::ServiceExt;
        use tower_sessions::{MemoryStore, SessionManagerLayer};

        use super::*;
        use crate::state::tests::test_state;

        async fn sign_in(session: Session) -> StatusCode {
            let user = CurrentUser {
                id: UserId::parse("user_1").expect("valid"),
                email: None,
                name: None,
            };
            match set_current_user(&session, &user).await {
                Ok(()) => StatusCode::NO_CONTENT,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }

        async fn whoami(OptionalUser(user): OptionalUser) -> String {
            user.map_or_else(|| "anonymous".to_owned(), |u| u.id.as_str().to_owned())
        }

        fn app() -> Router {
            Router::new()
                .route("/sign-in", get(sign_in))
                .route("/whoami", get(whoami))
                .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
                .with_state(test_state())
        }

        async fn whoami_with(app: Router, cookie: &str) -> String {
            let response = app
                .oneshot(
                    Request::get("/whoami")
                        .header(header::COOKIE, cookie)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            let body = axum::body::to_bytes(response.into_body(), 1024)
                .await
                .expect("body");
            String::from_utf8(body.to_vec()).expect("utf-8")
        }

        #[tokio::test]
        async fn test_rejected_identity_cookie_falls_back_to_dashboard_session() {
            let app = app();
            let response = app
                .clone()
                .oneshot(Request::get("/sign-in").body(Body::empty()).expect("request"))
                .await
                .expect("response");
            let session_cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(';').next())
                .expect("session cookie")
                .to_owned();

            assert_eq!(whoami_with(app.clone(), &session_cookie).await, "user_1");
            assert_eq!(
                whoami_with(app.clone(), &format!("{session_cookie}; __session=expired.or.garbage"))
                    .await,
                "user_1"
            );
            assert_eq!(whoami_with(app, "__session=expired.or.garbage").await, "anonymous");
        }
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthRejection::RedirectToSignIn.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).map(HeaderValue::as_bytes),
            Some(b"/sign-in".as_slice())
        );
    }
}
