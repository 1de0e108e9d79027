//! Store settings: rename and delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::instrument;

use crate::db::{RepositoryError, StoreRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, StoreForm};
use crate::middleware::Flash;
use crate::state::AppState;

use super::layout::{OwnedStore, Shell, failure};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/settings", get(show).post(rename))
        .route("/{store_id}/settings/delete", post(destroy))
}

#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub shell: Shell,
    pub action: String,
    pub delete_action: String,
    pub name: String,
    /// Base URL storefronts use for this store's API.
    pub api_url: String,
    pub errors: FieldErrors,
}

impl SettingsTemplate {
    fn new(state: &AppState, owned: &OwnedStore, shell: Shell) -> Self {
        Self {
            shell,
            action: owned.url("settings"),
            delete_action: owned.url("settings/delete"),
            name: owned.store.name.clone(),
            api_url: format!(
                "{}/api/{}",
                state.config().base_url.trim_end_matches('/'),
                owned.store.id
            ),
            errors: FieldErrors::default(),
        }
    }
}

/// GET /{store_id}/settings
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn show(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let shell = owned.shell(&state).await?;
    Ok(SettingsTemplate::new(&state, &owned, shell).into_response())
}

/// POST /{store_id}/settings
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn rename(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(form): Form<StoreForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let mut page = SettingsTemplate::new(&state, &owned, shell);
            page.name = form.name.unwrap_or_default();
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let flash = match StoreRepository::new(state.pool())
        .rename(owned.store.id, &owned.user.id, &input)
        .await
    {
        Ok(_) => Flash::success("Store updated."),
        Err(e) => failure("STORE_PATCH", &e),
    };
    Ok(owned.redirect_with(flash, &owned.url("settings")).await)
}

/// POST /{store_id}/settings/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(owned: OwnedStore, State(state): State<AppState>) -> Response {
    match StoreRepository::new(state.pool())
        .delete(owned.store.id, &owned.user.id)
        .await
    {
        Ok(()) => {
            tracing::info!(store_id = %owned.store.id, "Store deleted");
            owned.redirect_with(Flash::success("Store deleted."), "/").await
        }
        Err(RepositoryError::Conflict(message)) => {
            let flash = Flash::error(message);
            owned.redirect_with(flash, &owned.url("settings")).await
        }
        Err(e) => {
            let flash = failure("STORE_DELETE", &e);
            owned.redirect_with(flash, &owned.url("settings")).await
        }
    }
}
