//! Billboard pages.

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

use storekeep_core::{BillboardId, StoreId};

use crate::db::{BillboardRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::forms::{BillboardForm, FieldErrors};
use crate::middleware::Flash;
use crate::models::Billboard;
use crate::state::AppState;

use super::layout::{
    ApiHint, FormHeading, OwnedStore, Shell, UploadWidget, api_hints, failure, long_date,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/billboards", get(index))
        .route("/{store_id}/billboards/new", get(new).post(create))
        .route("/{store_id}/billboards/{billboard_id}", get(edit).post(update))
        .route("/{store_id}/billboards/{billboard_id}/delete", post(destroy))
}

#[derive(Debug, Clone)]
pub struct BillboardRow {
    pub id: String,
    pub label: String,
    pub created_at: String,
}

impl From<&Billboard> for BillboardRow {
    fn from(billboard: &Billboard) -> Self {
        Self {
            id: billboard.id.to_string(),
            label: billboard.label.clone(),
            created_at: long_date(&billboard.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "billboards/index.html")]
pub struct BillboardsIndexTemplate {
    pub shell: Shell,
    pub base_path: String,
    pub rows: Vec<BillboardRow>,
    pub hints: Vec<ApiHint>,
}

#[derive(Template, WebTemplate)]
#[template(path = "billboards/form.html")]
pub struct BillboardFormTemplate {
    pub shell: Shell,
    pub heading: FormHeading,
    pub base_path: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub upload: UploadWidget,
    pub label: String,
    pub image_url: String,
    pub errors: FieldErrors,
}

impl BillboardFormTemplate {
    fn new(
        state: &AppState,
        owned: &OwnedStore,
        shell: Shell,
        billboard: Option<&Billboard>,
    ) -> Self {
        let base_path = owned.url("billboards");
        let (action, delete_action) = billboard.map_or_else(
            || (format!("{base_path}/new"), None),
            |b| {
                (
                    format!("{base_path}/{}", b.id),
                    Some(format!("{base_path}/{}/delete", b.id)),
                )
            },
        );
        Self {
            shell,
            heading: FormHeading::new("billboard", billboard.is_some()),
            base_path,
            action,
            delete_action,
            upload: UploadWidget::new(state, owned.store.id),
            label: billboard.map(|b| b.label.clone()).unwrap_or_default(),
            image_url: billboard.map(|b| b.image_url.clone()).unwrap_or_default(),
            errors: FieldErrors::default(),
        }
    }

    fn with_input(mut self, form: BillboardForm, errors: FieldErrors) -> Self {
        self.label = form.label.unwrap_or_default();
        self.image_url = form.image_url.unwrap_or_default();
        self.errors = errors;
        self
    }
}

/// GET /{store_id}/billboards
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn index(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    Ok(BillboardsIndexTemplate {
        shell: owned.shell(&state).await?,
        base_path: owned.url("billboards"),
        rows: billboards.iter().map(BillboardRow::from).collect(),
        hints: api_hints(
            &state.config().base_url,
            owned.store.id,
            "billboards",
            "billboardId",
        ),
    }
    .into_response())
}

/// GET /{store_id}/billboards/new
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn new(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let shell = owned.shell(&state).await?;
    Ok(BillboardFormTemplate::new(&state, &owned, shell, None).into_response())
}

/// GET /{store_id}/billboards/{billboard_id}
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn edit(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, billboard_id)): Path<(StoreId, String)>,
) -> Result<Response, AppError> {
    let billboard = match billboard_id.parse::<BillboardId>() {
        Ok(id) => {
            BillboardRepository::new(state.pool())
                .get(owned.store.id, id)
                .await?
        }
        Err(_) => None,
    };
    let shell = owned.shell(&state).await?;
    Ok(BillboardFormTemplate::new(&state, &owned, shell, billboard.as_ref()).into_response())
}

/// POST /{store_id}/billboards/new
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn create(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(form): Form<BillboardForm>,
) -> Result<Response, AppError> {
    let input = match form.validate(|url| state.accepts_image_url(url)) {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page =
                BillboardFormTemplate::new(&state, &owned, shell, None).with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match BillboardRepository::new(state.pool())
        .create(owned.store.id, &input)
        .await
    {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Billboard created."), &owned.url("billboards"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("BILLBOARDS_POST", &e));
            let page = BillboardFormTemplate::new(&state, &owned, shell, None)
                .with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/billboards/{billboard_id}
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn update(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, billboard_id)): Path<(StoreId, BillboardId)>,
    Form(form): Form<BillboardForm>,
) -> Result<Response, AppError> {
    let repo = BillboardRepository::new(state.pool());
    let Some(billboard) = repo.get(owned.store.id, billboard_id).await? else {
        return Ok(owned
            .redirect_with(Flash::error("Billboard not found."), &owned.url("billboards"))
            .await);
    };

    let input = match form.validate(|url| state.accepts_image_url(url)) {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = BillboardFormTemplate::new(&state, &owned, shell, Some(&billboard))
                .with_input(form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match repo.update(owned.store.id, billboard_id, &input).await {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Billboard updated."), &owned.url("billboards"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("BILLBOARD_PATCH", &e));
            let page = BillboardFormTemplate::new(&state, &owned, shell, Some(&billboard))
                .with_input(form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/billboards/{billboard_id}/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, billboard_id)): Path<(StoreId, BillboardId)>,
) -> Response {
    let flash = match BillboardRepository::new(state.pool())
        .delete(owned.store.id, billboard_id)
        .await
    {
        Ok(()) => Flash::success("Billboard deleted."),
        Err(RepositoryError::Conflict(message)) => Flash::error(message),
        Err(RepositoryError::NotFound) => Flash::error("Billboard not found."),
        Err(e) => failure("BILLBOARD_DELETE", &e),
    };
    owned.redirect_with(flash, &owned.url("billboards")).await
}
