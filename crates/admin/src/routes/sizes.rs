//! Size pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::instrument;

use storekeep_core::{SizeId, StoreId};

use crate::db::{RepositoryError, SizeRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, SizeForm};
use crate::middleware::Flash;
use crate::models::Size;
use crate::state::AppState;

use super::layout::{ApiHint, FormHeading, OwnedStore, Shell, api_hints, failure, long_date};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/sizes", get(index))
        .route("/{store_id}/sizes/new", get(new).post(create))
        .route("/{store_id}/sizes/{size_id}", get(edit).post(update))
        .route("/{store_id}/sizes/{size_id}/delete", post(destroy))
}

/// Table row.
#[derive(Debug, Clone)]
pub struct SizeRow {
    pub id: String,
    pub name: String,
    pub value: String,
    pub created_at: String,
}

impl From<&Size> for SizeRow {
    fn from(size: &Size) -> Self {
        Self {
            id: size.id.to_string(),
            name: size.name.clone(),
            value: size.value.clone(),
            created_at: long_date(&size.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "sizes/index.html")]
pub struct SizesIndexTemplate {
    pub shell: Shell,
    pub base_path: String,
    pub rows: Vec<SizeRow>,
    pub hints: Vec<ApiHint>,
}

#[derive(Template, WebTemplate)]
#[template(path = "sizes/form.html")]
pub struct SizeFormTemplate {
    pub shell: Shell,
    pub heading: FormHeading,
    pub base_path: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub name: String,
    pub value: String,
    pub errors: FieldErrors,
}

impl SizeFormTemplate {
    fn new(owned: &OwnedStore, shell: Shell, size: Option<&Size>) -> Self {
        let base_path = owned.url("sizes");
        let (action, delete_action) = size.map_or_else(
            || (format!("{base_path}/new"), None),
            |s| {
                (
                    format!("{base_path}/{}", s.id),
                    Some(format!("{base_path}/{}/delete", s.id)),
                )
            },
        );
        Self {
            shell,
            heading: FormHeading::new("size", size.is_some()),
            base_path,
            action,
            delete_action,
            name: size.map(|s| s.name.clone()).unwrap_or_default(),
            value: size.map(|s| s.value.clone()).unwrap_or_default(),
            errors: FieldErrors::default(),
        }
    }

    /// Keep what the user typed.
    fn with_input(mut self, form: SizeForm, errors: FieldErrors) -> Self {
        self.name = form.name.unwrap_or_default();
        self.value = form.value.unwrap_or_default();
        self.errors = errors;
        self
    }
}

/// GET /{store_id}/sizes
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn index(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let sizes = SizeRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    Ok(SizesIndexTemplate {
        shell: owned.shell(&state).await?,
        base_path: owned.url("sizes"),
        rows: sizes.iter().map(SizeRow::from).collect(),
        hints: api_hints(&state.config().base_url, owned.store.id, "sizes", "sizeId"),
    }
    .into_response())
}

/// GET /{store_id}/sizes/new
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn new(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let shell = owned.shell(&state).await?;
    Ok(SizeFormTemplate::new(&owned, shell, None).into_response())
}

/// GET /{store_id}/sizes/{size_id}
///
/// An id that is malformed or not in this store shows the create form.
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn edit(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, size_id)): Path<(StoreId, String)>,
) -> Result<Response, AppError> {
    let size = match size_id.parse::<SizeId>() {
        Ok(id) => SizeRepository::new(state.pool()).get(owned.store.id, id).await?,
        Err(_) => None,
    };
    let shell = owned.shell(&state).await?;
    Ok(SizeFormTemplate::new(&owned, shell, size.as_ref()).into_response())
}

/// POST /{store_id}/sizes/new
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn create(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(form): Form<SizeForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = SizeFormTemplate::new(&owned, shell, None).with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match SizeRepository::new(state.pool())
        .create(owned.store.id, &input)
        .await
    {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Size created."), &owned.url("sizes"))
            .await),
        Err(e) => {
            let shell = owned.shell(&state).await?.with_flash(failure("SIZES_POST", &e));
            let page =
                SizeFormTemplate::new(&owned, shell, None).with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/sizes/{size_id}
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn update(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, size_id)): Path<(StoreId, SizeId)>,
    Form(form): Form<SizeForm>,
) -> Result<Response, AppError> {
    let repo = SizeRepository::new(state.pool());
    let Some(size) = repo.get(owned.store.id, size_id).await? else {
        return Ok(owned
            .redirect_with(Flash::error("Size not found."), &owned.url("sizes"))
            .await);
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = SizeFormTemplate::new(&owned, shell, Some(&size)).with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match repo.update(owned.store.id, size_id, &input).await {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Size updated."), &owned.url("sizes"))
            .await),
        Err(e) => {
            let shell = owned.shell(&state).await?.with_flash(failure("SIZE_PATCH", &e));
            let page = SizeFormTemplate::new(&owned, shell, Some(&size))
                .with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/sizes/{size_id}/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, size_id)): Path<(StoreId, SizeId)>,
) -> Response {
    let flash = match SizeRepository::new(state.pool())
        .delete(owned.store.id, size_id)
        .await
    {
        Ok(()) => Flash::success("Size deleted."),
        Err(RepositoryError::Conflict(message)) => Flash::error(message),
        Err(RepositoryError::NotFound) => Flash::error("Size not found."),
        Err(e) => failure("SIZE_DELETE", &e),
    };
    owned.redirect_with(flash, &owned.url("sizes")).await
}
