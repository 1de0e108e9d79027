//! Category pages.

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

use storekeep_core::{CategoryId, StoreId};

use crate::db::{BillboardRepository, CategoryRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::forms::{CategoryForm, FieldErrors};
use crate::middleware::Flash;
use crate::models::{Billboard, Category, CategoryInput};
use crate::state::AppState;

use super::layout::{
    ApiHint, FormHeading, OwnedStore, SelectOption, Shell, api_hints, failure, long_date,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/categories", get(index))
        .route("/{store_id}/categories/new", get(new).post(create))
        .route("/{store_id}/categories/{category_id}", get(edit).post(update))
        .route("/{store_id}/categories/{category_id}/delete", post(destroy))
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub billboard: String,
    pub created_at: String,
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name.clone(),
            billboard: category.billboard_label.clone(),
            created_at: long_date(&category.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub shell: Shell,
    pub base_path: String,
    pub rows: Vec<CategoryRow>,
    pub hints: Vec<ApiHint>,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub shell: Shell,
    pub heading: FormHeading,
    pub base_path: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub name: String,
    pub billboards: Vec<SelectOption>,
    pub errors: FieldErrors,
}

impl CategoryFormTemplate {
    fn new(
        owned: &OwnedStore,
        shell: Shell,
        billboards: &[Billboard],
        category: Option<&Category>,
    ) -> Self {
        let base_path = owned.url("categories");
        let (action, delete_action) = category.map_or_else(
            || (format!("{base_path}/new"), None),
            |c| {
                (
                    format!("{base_path}/{}", c.id),
                    Some(format!("{base_path}/{}/delete", c.id)),
                )
            },
        );
        let selected = category
            .map(|c| c.billboard_id.to_string())
            .unwrap_or_default();

        Self {
            shell,
            heading: FormHeading::new("category", category.is_some()),
            base_path,
            action,
            delete_action,
            name: category.map(|c| c.name.clone()).unwrap_or_default(),
            billboards: billboard_options(billboards, &selected),
            errors: FieldErrors::default(),
        }
    }

    fn with_input(
        mut self,
        billboards: &[Billboard],
        form: CategoryForm,
        errors: FieldErrors,
    ) -> Self {
        self.name = form.name.unwrap_or_default();
        self.billboards =
            billboard_options(billboards, form.billboard_id.as_deref().unwrap_or_default().trim());
        self.errors = errors;
        self
    }
}

fn billboard_options(billboards: &[Billboard], selected: &str) -> Vec<SelectOption> {
    SelectOption::list(billboards, selected, |b| (b.id.to_string(), b.label.clone()))
}

/// GET /{store_id}/categories
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn index(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let categories = CategoryRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    Ok(CategoriesIndexTemplate {
        shell: owned.shell(&state).await?,
        base_path: owned.url("categories"),
        rows: categories.iter().map(CategoryRow::from).collect(),
        hints: api_hints(
            &state.config().base_url,
            owned.store.id,
            "categories",
            "categoryId",
        ),
    }
    .into_response())
}

/// GET /{store_id}/categories/new
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn new(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;
    let shell = owned.shell(&state).await?;
    Ok(CategoryFormTemplate::new(&owned, shell, &billboards, None).into_response())
}

/// GET /{store_id}/categories/{category_id}
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn edit(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, category_id)): Path<(StoreId, String)>,
) -> Result<Response, AppError> {
    let category = match category_id.parse::<CategoryId>() {
        Ok(id) => {
            CategoryRepository::new(state.pool())
                .get(owned.store.id, id)
                .await?
        }
        Err(_) => None,
    };
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;
    let shell = owned.shell(&state).await?;
    Ok(CategoryFormTemplate::new(&owned, shell, &billboards, category.as_ref()).into_response())
}

/// Validate, including that the billboard belongs to this store.
async fn validate(
    state: &AppState,
    owned: &OwnedStore,
    form: &CategoryForm,
) -> Result<Result<CategoryInput, FieldErrors>, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(Err(errors)),
    };
    let in_store = BillboardRepository::new(state.pool())
        .exists_in_store(owned.store.id, input.billboard_id)
        .await?;
    if in_store {
        Ok(Ok(input))
    } else {
        Ok(Err(FieldErrors::default()
            .with("billboardId", "Billboard not found in this store")))
    }
}

/// POST /{store_id}/categories/new
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn create(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    let input = match validate(&state, &owned, &form).await? {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = CategoryFormTemplate::new(&owned, shell, &billboards, None)
                .with_input(&billboards, form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match CategoryRepository::new(state.pool())
        .create(owned.store.id, &input)
        .await
    {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Category created."), &owned.url("categories"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("CATEGORIES_POST", &e));
            let page = CategoryFormTemplate::new(&owned, shell, &billboards, None).with_input(
                &billboards,
                form,
                FieldErrors::default(),
            );
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/categories/{category_id}
#[instrument(skip(owned, state, form), fields(store_id = %owned.store.id))]
async fn update(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, category_id)): Path<(StoreId, CategoryId)>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let repo = CategoryRepository::new(state.pool());
    let Some(category) = repo.get(owned.store.id, category_id).await? else {
        return Ok(owned
            .redirect_with(Flash::error("Category not found."), &owned.url("categories"))
            .await);
    };
    let billboards = BillboardRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    let input = match validate(&state, &owned, &form).await? {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = CategoryFormTemplate::new(&owned, shell, &billboards, Some(&category))
                .with_input(&billboards, form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match repo.update(owned.store.id, category_id, &input).await {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Category updated."), &owned.url("categories"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("CATEGORY_PATCH", &e));
            let page = CategoryFormTemplate::new(&owned, shell, &billboards, Some(&category))
                .with_input(&billboards, form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/categories/{category_id}/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, category_id)): Path<(StoreId, CategoryId)>,
) -> Response {
    let flash = match CategoryRepository::new(state.pool())
        .delete(owned.store.id, category_id)
        .await
    {
        Ok(()) => Flash::success("Category deleted."),
        Err(RepositoryError::Conflict(message)) => Flash::error(message),
        Err(RepositoryError::NotFound) => Flash::error("Category not found."),
        Err(e) => failure("CATEGORY_DELETE", &e),
    };
    owned.redirect_with(flash, &owned.url("categories")).await
}
