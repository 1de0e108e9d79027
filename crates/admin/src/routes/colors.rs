//! Color pages.

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

use storekeep_core::{ColorId, StoreId};

use crate::db::{RepositoryError, ColorRepository};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FieldErrors, ColorForm};
use crate::middleware::Flash;
use crate::models::Color;
use crate::state::AppState;

use super::layout::{ApiHint, FormHeading, OwnedStore, Shell, api_hints, failure, long_date};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/colors", get(index))
        .route("/{store_id}/colors/new", get(new).post(create))
        .route("/{store_id}/colors/{color_id}", get(edit).post(update))
        .route("/{store_id}/colors/{color_id}/delete", post(destroy))
}

/// Table row.
#[derive(Debug, Clone)]
pub struct ColorRow {
    pub id: String,
    pub name: String,
    pub value: String,
    pub created_at: String,
}

impl From<&Color> for ColorRow {
    fn from(color: &Color) -> Self {
        Self {
            id: color.id.to_string(),
            name: color.name.clone(),
            value: color.value.clone(),
            created_at: long_date(&color.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "colors/index.html")]
pub struct ColorsIndexTemplate {
    pub shell: Shell,
    pub base_path: String,
    pub rows: Vec<ColorRow>,
    pub hints: Vec<ApiHint>,
}

#[derive(Template, WebTemplate)]
#[template(path = "colors/form.html")]
pub struct ColorFormTemplate {
    pub shell: Shell,
    pub heading: FormHeading,
    pub base_path: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub name: String,
    pub value: String,
    pub errors: FieldErrors,
}

impl ColorFormTemplate {
    fn new(owned: &OwnedStore, shell: Shell, color: Option<&Color>) -> Self {
        let base_path = owned.url("colors");
        let (action, delete_action) = color.map_or_else(
            || (format!("{base_path}/new"), None),
            |c| {
                (
                    format!("{base_path}/{}", c.id),
                    Some(format!("{base_path}/{}/delete", c.id)),
                )
            },
        );
        Self {
            shell,
            heading: FormHeading::new("color", color.is_some()),
            base_path,
            action,
            delete_action,
            name: color.map(|c| c.name.clone()).unwrap_or_default(),
            value: color.map(|c| c.value.clone()).unwrap_or_default(),
            errors: FieldErrors::default(),
        }
    }

    /// Keep what the user typed.
    fn with_input(mut self, form: ColorForm, errors: FieldErrors) -> Self {
        self.name = form.name.unwrap_or_default();
        self.value = form.value.unwrap_or_default();
        self.errors = errors;
        self
    }
}

/// GET /{store_id}/colors
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn index(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let colors = ColorRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    Ok(ColorsIndexTemplate {
        shell: owned.shell(&state).await?,
        base_path: owned.url("colors"),
        rows: colors.iter().map(ColorRow::from).collect(),
        hints: api_hints(&state.config().base_url, owned.store.id, "colors", "colorId"),
    }
    .into_response())
}

/// GET /{store_id}/colors/new
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn new(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let shell = owned.shell(&state).await?;
    Ok(ColorFormTemplate::new(&owned, shell, None).into_response())
}

/// GET /{store_id}/colors/{color_id}
///
/// An id that is malformed or not in this store shows the create form.
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn edit(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, color_id)): Path<(StoreId, String)>,
) -> Result<Response, AppError> {
    let color = match color_id.parse::<ColorId>() {
        Ok(id) => ColorRepository::new(state.pool()).get(owned.store.id, id).await?,
        Err(_) => None,
    };
    let shell = owned.shell(&state).await?;
    Ok(ColorFormTemplate::new(&owned, shell, color.as_ref()).into_response())
}

/// POST /{store_id}/colors/new
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn create(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(form): Form<ColorForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = ColorFormTemplate::new(&owned, shell, None).with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match ColorRepository::new(state.pool())
        .create(owned.store.id, &input)
        .await
    {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Color created."), &owned.url("colors"))
            .await),
        Err(e) => {
            let shell = owned.shell(&state).await?.with_flash(failure("COLORS_POST", &e));
            let page = ColorFormTemplate::new(&owned, shell, None)
                .with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/colors/{color_id}
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn update(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, color_id)): Path<(StoreId, ColorId)>,
    Form(form): Form<ColorForm>,
) -> Result<Response, AppError> {
    let repo = ColorRepository::new(state.pool());
    let Some(color) = repo.get(owned.store.id, color_id).await? else {
        return Ok(owned
            .redirect_with(Flash::error("Color not found."), &owned.url("colors"))
            .await);
    };

    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = ColorFormTemplate::new(&owned, shell, Some(&color)).with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match repo.update(owned.store.id, color_id, &input).await {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Color updated."), &owned.url("colors"))
            .await),
        Err(e) => {
            let shell = owned.shell(&state).await?.with_flash(failure("COLOR_PATCH", &e));
            let page = ColorFormTemplate::new(&owned, shell, Some(&color))
                .with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/colors/{color_id}/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, color_id)): Path<(StoreId, ColorId)>,
) -> Response {
    let flash = match ColorRepository::new(state.pool())
        .delete(owned.store.id, color_id)
        .await
    {
        Ok(()) => Flash::success("Color deleted."),
        Err(RepositoryError::Conflict(message)) => Flash::error(message),
        Err(RepositoryError::NotFound) => Flash::error("Color not found."),
        Err(e) => failure("COLOR_DELETE", &e),
    };
    owned.redirect_with(flash, &owned.url("colors")).await
}
