//! Sign-in through the hosted identity provider.
//!
//! `/sign-in` sends the browser to the provider with a one-time `state`
//! nonce kept in the session. The provider sends it back to `/auth/callback`
//! with a signed session token; once the nonce matches and the token
//! verifies, the user is stored in the dashboard session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::clear_sentry_user;
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::session_keys;
use crate::services::SessionClaims;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(sign_in))
        .route("/auth/callback", get(callback))
        .route("/sign-out", post(sign_out))
}

/// Shown when the provider's redirect cannot be accepted.
#[derive(Template, WebTemplate)]
#[template(path = "auth/error.html")]
pub struct SignInErrorTemplate {
    pub message: &'static str,
}

fn sign_in_error(status: StatusCode, message: &'static str) -> Response {
    (status, SignInErrorTemplate { message }).into_response()
}

/// Where the provider sends the browser back to.
fn callback_url(state: &AppState) -> String {
    format!(
        "{}/auth/callback",
        state.config().base_url.trim_end_matches('/')
    )
}

/// GET /sign-in
#[instrument(skip_all)]
async fn sign_in(
    OptionalUser(user): OptionalUser,
    State(state): State<AppState>,
    session: Session,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    let nonce = uuid::Uuid::new_v4().to_string();
    if let Err(e) = session.insert(session_keys::SIGN_IN_STATE, &nonce).await {
        tracing::error!(error = %e, "Failed to store sign-in state");
        return sign_in_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.",
        );
    }

    let url = state.identity().sign_in_url(&callback_url(&state), &nonce);
    Redirect::to(url.as_str()).into_response()
}

/// Query string of the provider's redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token: Option<String>,
    pub state: Option<String>,
}

/// GET /auth/callback
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let expected = session
        .remove::<String>(session_keys::SIGN_IN_STATE)
        .await
        .ok()
        .flatten();
    let state_matches = matches!(
        (expected.as_deref(), query.state.as_deref()),
        (Some(expected), Some(got)) if expected == got
    );
    if !state_matches {
        tracing::warn!("Sign-in callback with missing or mismatched state");
        return sign_in_error(
            StatusCode::BAD_REQUEST,
            "This sign-in link has expired or was already used.",
        );
    }

    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return sign_in_error(StatusCode::BAD_REQUEST, "The sign-in response had no token.");
    };

    let user = match state
        .identity()
        .verify(&token)
        .and_then(SessionClaims::into_user)
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected sign-in token");
            return sign_in_error(StatusCode::UNAUTHORIZED, "We could not verify your sign-in.");
        }
    };

    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "Failed to store signed-in user");
        return sign_in_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again.",
        );
    }

    tracing::info!(user_id = %user.id, "User signed in");
    Redirect::to("/").into_response()
}

/// POST /sign-out
#[instrument(skip_all)]
async fn sign_out(State(state): State<AppState>, session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!(error = %e, "Failed to clear session on sign-out");
    }
    clear_sentry_user();

    let home = format!("{}/", state.config().base_url.trim_end_matches('/'));
    match state.identity().sign_out_url(&home) {
        Some(url) => Redirect::to(url.as_str()).into_response(),
        None => Redirect::to("/").into_response(),
    }
}
