//! Landing redirect and store creation.
//!
//! A signed-in user lands on their oldest store; a user without stores gets
//! the create-store form instead.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{OriginalUri, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, StoreForm};
use crate::middleware::{Flash, RequireUser};
use crate::models::CurrentUser;
use crate::state::AppState;

use super::layout::{Shell, failure};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/stores", get(new).post(create))
}

#[derive(Template, WebTemplate)]
#[template(path = "home/create_store.html")]
pub struct CreateStoreTemplate {
    pub shell: Shell,
    pub name: String,
    pub errors: FieldErrors,
    /// Users without a store cannot dismiss the form.
    pub can_cancel: bool,
}

async fn create_page(
    state: &AppState,
    session: &Session,
    user: CurrentUser,
    path: &str,
) -> Result<CreateStoreTemplate, AppError> {
    let shell = Shell::load(state, session, user, None, path.to_owned()).await?;
    Ok(CreateStoreTemplate {
        can_cancel: !shell.stores.is_empty(),
        shell,
        name: String::new(),
        errors: FieldErrors::default(),
    })
}

/// GET /
#[instrument(skip(user, state, session), fields(user_id = %user.id))]
async fn home(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    if let Some(store) = StoreRepository::new(state.pool())
        .first_for_user(&user.id)
        .await?
    {
        return Ok(Redirect::to(&format!("/{}", store.id)).into_response());
    }
    Ok(create_page(&state, &session, user, "/").await?.into_response())
}

/// GET /stores
#[instrument(skip(user, state, session, uri), fields(user_id = %user.id))]
async fn new(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, AppError> {
    Ok(create_page(&state, &session, user, uri.path())
        .await?
        .into_response())
}

/// POST /stores
#[instrument(skip(user, state, session, form), fields(user_id = %user.id))]
async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<StoreForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let mut page = create_page(&state, &session, user, "/stores").await?;
            page.name = form.name.unwrap_or_default();
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match StoreRepository::new(state.pool())
        .create(&user.id, &input)
        .await
    {
        Ok(store) => {
            tracing::info!(store_id = %store.id, "Store created");
            Flash::success("Store created.").set(&session).await;
            Ok(Redirect::to(&format!("/{}", store.id)).into_response())
        }
        Err(e) => {
            let mut page = create_page(&state, &session, user, "/stores").await?;
            page.shell = page.shell.with_flash(failure("STORES_POST", &e));
            page.name = form.name.unwrap_or_default();
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}
