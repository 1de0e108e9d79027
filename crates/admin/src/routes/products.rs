//! Product pages.

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

use storekeep_core::{ProductId, StoreId};

use crate::db::{
    CategoryRepository, ColorRepository, ProductRepository, RepositoryError, SizeRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::forms::{Amount, FieldErrors, ProductForm, ProductFormFields};
use crate::middleware::Flash;
use crate::models::{Category, Color, Product, ProductInput, Size};
use crate::state::AppState;

use super::layout::{
    ApiHint, FormHeading, OwnedStore, SelectOption, Shell, UploadWidget, api_hints, failure,
    long_date, money,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{store_id}/products", get(index))
        .route("/{store_id}/products/new", get(new).post(create))
        .route("/{store_id}/products/{product_id}", get(edit).post(update))
        .route("/{store_id}/products/{product_id}/delete", post(destroy))
}

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub is_archived: bool,
    pub is_featured: bool,
    pub price: String,
    pub category: String,
    pub size: String,
    pub color: String,
    pub created_at: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            is_archived: product.is_archived,
            is_featured: product.is_featured,
            price: money(product.price),
            category: product.category_name.clone(),
            size: product.size.name.clone(),
            color: product.color.value.clone(),
            created_at: long_date(&product.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub shell: Shell,
    pub base_path: String,
    pub rows: Vec<ProductRow>,
    pub hints: Vec<ApiHint>,
}

/// Categories, sizes and colors offered by the form's selects.
struct Choices {
    categories: Vec<Category>,
    sizes: Vec<Size>,
    colors: Vec<Color>,
}

impl Choices {
    async fn load(state: &AppState, store_id: StoreId) -> Result<Self, RepositoryError> {
        let pool = state.pool();
        Ok(Self {
            categories: CategoryRepository::new(pool).list_for_store(store_id).await?,
            sizes: SizeRepository::new(pool).list_for_store(store_id).await?,
            colors: ColorRepository::new(pool).list_for_store(store_id).await?,
        })
    }

    fn contains(&self, input: &ProductInput) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if !self.categories.iter().any(|c| c.id == input.category_id) {
            errors = errors.with("categoryId", "Category not found in this store");
        }
        if !self.sizes.iter().any(|s| s.id == input.size_id) {
            errors = errors.with("sizeId", "Size not found in this store");
        }
        if !self.colors.iter().any(|c| c.id == input.color_id) {
            errors = errors.with("colorId", "Color not found in this store");
        }
        errors
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub shell: Shell,
    pub heading: FormHeading,
    pub base_path: String,
    pub action: String,
    pub delete_action: Option<String>,
    pub upload: UploadWidget,
    pub name: String,
    pub price: String,
    pub image_urls: String,
    pub categories: Vec<SelectOption>,
    pub sizes: Vec<SelectOption>,
    pub colors: Vec<SelectOption>,
    pub is_featured: bool,
    pub is_archived: bool,
    pub errors: FieldErrors,
}

impl ProductFormTemplate {
    fn new(
        state: &AppState,
        owned: &OwnedStore,
        shell: Shell,
        choices: &Choices,
        product: Option<&Product>,
    ) -> Self {
        let base_path = owned.url("products");
        let (action, delete_action) = product.map_or_else(
            || (format!("{base_path}/new"), None),
            |p| {
                (
                    format!("{base_path}/{}", p.id),
                    Some(format!("{base_path}/{}/delete", p.id)),
                )
            },
        );
        let mut page = Self {
            shell,
            heading: FormHeading::new("product", product.is_some()),
            base_path,
            action,
            delete_action,
            upload: UploadWidget::new(state, owned.store.id),
            name: product.map(|p| p.name.clone()).unwrap_or_default(),
            price: product.map(|p| p.price.to_string()).unwrap_or_default(),
            image_urls: product
                .map(|p| {
                    p.images
                        .iter()
                        .map(|image| image.url.as_str())
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default(),
            categories: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            is_featured: product.is_some_and(|p| p.is_featured),
            is_archived: product.is_some_and(|p| p.is_archived),
            errors: FieldErrors::default(),
        };
        page.select(
            choices,
            &product.map(|p| p.category_id.to_string()).unwrap_or_default(),
            &product.map(|p| p.size_id.to_string()).unwrap_or_default(),
            &product.map(|p| p.color_id.to_string()).unwrap_or_default(),
        );
        page
    }

    fn select(&mut self, choices: &Choices, category: &str, size: &str, color: &str) {
        self.categories = SelectOption::list(&choices.categories, category, |c| {
            (c.id.to_string(), c.name.clone())
        });
        self.sizes = SelectOption::list(&choices.sizes, size, |s| {
            (s.id.to_string(), s.name.clone())
        });
        self.colors = SelectOption::list(&choices.colors, color, |c| {
            (c.id.to_string(), c.name.clone())
        });
    }

    fn with_input(mut self, choices: &Choices, form: &ProductForm, errors: FieldErrors) -> Self {
        let trimmed = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_owned();
        self.name = form.name.clone().unwrap_or_default();
        self.price = form.price.as_ref().map(Amount::as_text).unwrap_or_default();
        self.image_urls = form.image_lines();
        self.is_featured = form.is_featured;
        self.is_archived = form.is_archived;
        self.select(
            choices,
            &trimmed(&form.category_id),
            &trimmed(&form.size_id),
            &trimmed(&form.color_id),
        );
        self.errors = errors;
        self
    }
}

/// GET /{store_id}/products
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn index(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let products = ProductRepository::new(state.pool())
        .list_for_store(owned.store.id)
        .await?;

    Ok(ProductsIndexTemplate {
        shell: owned.shell(&state).await?,
        base_path: owned.url("products"),
        rows: products.iter().map(ProductRow::from).collect(),
        hints: api_hints(
            &state.config().base_url,
            owned.store.id,
            "products",
            "productId",
        ),
    }
    .into_response())
}

/// GET /{store_id}/products/new
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn new(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let choices = Choices::load(&state, owned.store.id).await?;
    let shell = owned.shell(&state).await?;
    Ok(ProductFormTemplate::new(&state, &owned, shell, &choices, None).into_response())
}

/// GET /{store_id}/products/{product_id}
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn edit(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, product_id)): Path<(StoreId, String)>,
) -> Result<Response, AppError> {
    let product = match product_id.parse::<ProductId>() {
        Ok(id) => {
            ProductRepository::new(state.pool())
                .get(owned.store.id, id)
                .await?
        }
        Err(_) => None,
    };
    let choices = Choices::load(&state, owned.store.id).await?;
    let shell = owned.shell(&state).await?;
    let page = ProductFormTemplate::new(&state, &owned, shell, &choices, product.as_ref());
    Ok(page.into_response())
}

/// Schema validation, then the store check on the selected options.
fn validate(
    state: &AppState,
    choices: &Choices,
    form: &ProductForm,
) -> Result<ProductInput, FieldErrors> {
    let input = form.validate(|url| state.accepts_image_url(url))?;
    let errors = choices.contains(&input);
    if errors.is_empty() {
        Ok(input)
    } else {
        Err(errors)
    }
}

/// POST /{store_id}/products/new
#[instrument(skip(owned, state, body), fields(store_id = %owned.store.id))]
async fn create(
    owned: OwnedStore,
    State(state): State<AppState>,
    Form(body): Form<ProductFormFields>,
) -> Result<Response, AppError> {
    let form = ProductForm::from(body);
    let choices = Choices::load(&state, owned.store.id).await?;

    let input = match validate(&state, &choices, &form) {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = ProductFormTemplate::new(&state, &owned, shell, &choices, None)
                .with_input(&choices, &form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match ProductRepository::new(state.pool())
        .create(owned.store.id, &input)
        .await
    {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Product created."), &owned.url("products"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("PRODUCTS_POST", &e));
            let page = ProductFormTemplate::new(&state, &owned, shell, &choices, None)
                .with_input(&choices, &form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/products/{product_id}
#[instrument(skip(owned, state, body), fields(store_id = %owned.store.id))]
async fn update(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, product_id)): Path<(StoreId, ProductId)>,
    Form(body): Form<ProductFormFields>,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let Some(product) = repo.get(owned.store.id, product_id).await? else {
        return Ok(owned
            .redirect_with(Flash::error("Product not found."), &owned.url("products"))
            .await);
    };
    let form = ProductForm::from(body);
    let choices = Choices::load(&state, owned.store.id).await?;

    let input = match validate(&state, &choices, &form) {
        Ok(input) => input,
        Err(errors) => {
            let shell = owned.shell(&state).await?;
            let page = ProductFormTemplate::new(&state, &owned, shell, &choices, Some(&product))
                .with_input(&choices, &form, errors);
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match repo.update(owned.store.id, product_id, &input).await {
        Ok(_) => Ok(owned
            .redirect_with(Flash::success("Product updated."), &owned.url("products"))
            .await),
        Err(e) => {
            let shell = owned
                .shell(&state)
                .await?
                .with_flash(failure("PRODUCT_PATCH", &e));
            let page = ProductFormTemplate::new(&state, &owned, shell, &choices, Some(&product))
                .with_input(&choices, &form, FieldErrors::default());
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// POST /{store_id}/products/{product_id}/delete
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn destroy(
    owned: OwnedStore,
    State(state): State<AppState>,
    Path((_, product_id)): Path<(StoreId, ProductId)>,
) -> Response {
    let flash = match ProductRepository::new(state.pool())
        .delete(owned.store.id, product_id)
        .await
    {
        Ok(()) => Flash::success("Product deleted."),
        Err(RepositoryError::NotFound) => Flash::error("Product not found."),
        Err(e) => failure("PRODUCT_DELETE", &e),
    };
    owned.redirect_with(flash, &owned.url("products")).await
}
