//! Store overview page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use crate::db::{StoreRepository, stores::StoreCounts};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

use super::layout::{OwnedStore, Shell};

pub fn router() -> Router<AppState> {
    Router::new().route("/{store_id}", get(overview))
}

/// Count card linking to the entity's list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountCard {
    pub label: &'static str,
    pub count: i64,
    pub href: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard/overview.html")]
pub struct OverviewTemplate {
    pub shell: Shell,
    pub cards: Vec<CountCard>,
    pub featured_products: i64,
    pub archived_products: i64,
}

fn cards(owned: &OwnedStore, counts: &StoreCounts) -> Vec<CountCard> {
    [
        ("Products", counts.products, "products"),
        ("Categories", counts.categories, "categories"),
        ("Billboards", counts.billboards, "billboards"),
        ("Sizes", counts.sizes, "sizes"),
        ("Colors", counts.colors, "colors"),
    ]
    .into_iter()
    .map(|(label, count, section)| CountCard {
        label,
        count,
        href: owned.url(section),
    })
    .collect()
}

/// GET /{store_id}
#[instrument(skip(owned, state), fields(store_id = %owned.store.id))]
async fn overview(owned: OwnedStore, State(state): State<AppState>) -> Result<Response, AppError> {
    let counts = StoreRepository::new(state.pool())
        .counts(owned.store.id)
        .await?;

    Ok(OverviewTemplate {
        shell: owned.shell(&state).await?,
        cards: cards(&owned, &counts),
        featured_products: counts.featured_products,
        archived_products: counts.archived_products,
    }
    .into_response())
}
