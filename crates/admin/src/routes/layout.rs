//! Shared pieces of every dashboard page.
//!
//! [`OwnedStore`] is the layout guard: no user redirects to `/sign-in`, a
//! store the user does not own (or a malformed store id) redirects to `/`.
//! [`Shell`] carries what `base.html` renders around every page: the user
//! button, the store switcher, the store navigation and the pending toast.

use axum::{
    extract::{FromRequestParts, OriginalUri, RawPathParams},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use tower_sessions::Session;

use storekeep_core::StoreId;

use crate::db::{RepositoryError, StoreRepository};
use crate::error::AppError;
use crate::middleware::{Flash, RequireUser};
use crate::models::{CurrentUser, Store};
use crate::state::AppState;

// =============================================================================
// Layout guard
// =============================================================================

/// The signed-in user together with a store they own, taken from the
/// `{store_id}` path segment.
pub struct OwnedStore {
    pub user: CurrentUser,
    pub store: Store,
    pub session: Session,
    /// Request path, used to highlight the active navigation link.
    pub path: String,
}

impl FromRequestParts<AppState> for OwnedStore {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let Some(store_id) = params
            .iter()
            .find(|(name, _)| *name == "store_id")
            .and_then(|(_, value)| value.parse::<StoreId>().ok())
        else {
            return Err(Redirect::to("/").into_response());
        };

        let store = StoreRepository::new(state.pool())
            .get_owned(store_id, &user.id)
            .await
            .map_err(|e| AppError::from(e).into_response())?
            .ok_or_else(|| Redirect::to("/").into_response())?;

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_owned(), |uri| uri.0.path().to_owned());

        Ok(Self {
            user,
            store,
            session,
            path,
        })
    }
}

impl OwnedStore {
    /// Build the page shell, taking the pending toast.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store switcher cannot be loaded.
    pub async fn shell(&self, state: &AppState) -> Result<Shell, AppError> {
        Shell::load(
            state,
            &self.session,
            self.user.clone(),
            Some(self.store.clone()),
            self.path.clone(),
        )
        .await
    }

    /// `/{store_id}/{section}`
    #[must_use]
    pub fn url(&self, section: &str) -> String {
        format!("/{}/{section}", self.store.id)
    }

    /// Store a toast and redirect.
    pub async fn redirect_with(&self, flash: Flash, location: &str) -> Response {
        flash.set(&self.session).await;
        Redirect::to(location).into_response()
    }
}

// =============================================================================
// Shell
// =============================================================================

/// Link in the store navigation.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Store switcher entry.
#[derive(Debug, Clone)]
pub struct StoreLink {
    pub href: String,
    pub name: String,
    pub active: bool,
}

/// What `base.html` renders around every signed-in page.
#[derive(Debug, Clone)]
pub struct Shell {
    pub user: CurrentUser,
    pub store: Option<Store>,
    pub stores: Vec<StoreLink>,
    pub nav: Vec<NavLink>,
    pub flash: Option<Flash>,
}

const SECTIONS: [(&str, &str); 7] = [
    ("", "Overview"),
    ("billboards", "Billboards"),
    ("categories", "Categories"),
    ("sizes", "Sizes"),
    ("colors", "Colors"),
    ("products", "Products"),
    ("settings", "Settings"),
];

impl Shell {
    /// Load the user's stores and take the pending toast.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the stores cannot be listed.
    pub async fn load(
        state: &AppState,
        session: &Session,
        user: CurrentUser,
        store: Option<Store>,
        path: String,
    ) -> Result<Self, AppError> {
        let stores = StoreRepository::new(state.pool())
            .list_for_user(&user.id)
            .await?;
        let flash = Flash::take(session).await;
        Ok(Self::build(user, store, &stores, flash, &path))
    }

    fn build(
        user: CurrentUser,
        store: Option<Store>,
        stores: &[Store],
        flash: Option<Flash>,
        path: &str,
    ) -> Self {
        let active_id = store.as_ref().map(|s| s.id);

        let stores = stores
            .iter()
            .map(|s| StoreLink {
                href: format!("/{}", s.id),
                name: s.name.clone(),
                active: Some(s.id) == active_id,
            })
            .collect();

        let nav = active_id.map_or_else(Vec::new, |id| {
            SECTIONS
                .iter()
                .map(|&(section, label)| {
                    let href = if section.is_empty() {
                        format!("/{id}")
                    } else {
                        format!("/{id}/{section}")
                    };
                    let active = if section.is_empty() {
                        path == href
                    } else {
                        path == href || path.starts_with(&format!("{href}/"))
                    };
                    NavLink {
                        href,
                        label,
                        active,
                    }
                })
                .collect()
        });

        Self {
            user,
            store,
            stores,
            nav,
            flash,
        }
    }

    /// Name shown on the store switcher button.
    #[must_use]
    pub fn store_name(&self) -> &str {
        self.store.as_ref().map_or("Select a store", |s| s.name.as_str())
    }

    /// Replace the toast (used when re-rendering after a failure).
    #[must_use]
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Title, description and submit label of an entity form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormHeading {
    pub title: String,
    pub description: String,
    pub button: &'static str,
}

impl FormHeading {
    /// `noun` is the lowercase singular, e.g. `"size"`.
    #[must_use]
    pub fn new(noun: &str, editing: bool) -> Self {
        if editing {
            Self {
                title: format!("Edit {noun}"),
                description: format!("Edit a {noun}"),
                button: "Save changes",
            }
        } else {
            Self {
                title: format!("Create {noun}"),
                description: format!("Add a new {noun}"),
                button: "Create",
            }
        }
    }
}

/// `<option>` of a select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Options for `items`, selecting the one whose value equals `selected`.
    pub fn list<T>(
        items: &[T],
        selected: &str,
        parts: impl Fn(&T) -> (String, String),
    ) -> Vec<Self> {
        items
            .iter()
            .map(|item| {
                let (value, label) = parts(item);
                Self {
                    selected: value == selected,
                    value,
                    label,
                }
            })
            .collect()
    }
}

/// Settings for `image-upload.js`. Without media configuration the widget
/// falls back to typing URLs by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadWidget {
    pub enabled: bool,
    pub signature_url: String,
}

impl UploadWidget {
    #[must_use]
    pub fn new(state: &AppState, store_id: StoreId) -> Self {
        Self {
            enabled: state.media().is_some(),
            signature_url: format!("/api/{store_id}/media/signature"),
        }
    }
}

/// Log an unexpected failure and produce the generic toast.
pub fn failure(tag: &'static str, error: &RepositoryError) -> Flash {
    tracing::error!(error = %error, "[{tag}] request failed");
    Flash::something_went_wrong()
}

// =============================================================================
// API endpoint hints
// =============================================================================

/// One endpoint shown under a list page's "API" heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHint {
    pub method: &'static str,
    pub url: String,
    /// Public endpoints need no sign-in.
    pub public: bool,
}

impl ApiHint {
    #[must_use]
    pub const fn access(&self) -> &'static str {
        if self.public { "Public" } else { "Admin" }
    }
}

/// The five endpoints of one entity collection.
///
/// `entity` is the plural path segment, `id_name` the path parameter as shown
/// to the user (e.g. `sizeId`).
#[must_use]
pub fn api_hints(base_url: &str, store_id: StoreId, entity: &str, id_name: &str) -> Vec<ApiHint> {
    let collection = format!("{}/api/{store_id}/{entity}", base_url.trim_end_matches('/'));
    let item = format!("{collection}/{{{id_name}}}");
    vec![
        ApiHint {
            method: "GET",
            url: collection.clone(),
            public: true,
        },
        ApiHint {
            method: "GET",
            url: item.clone(),
            public: true,
        },
        ApiHint {
            method: "POST",
            url: collection,
            public: false,
        },
        ApiHint {
            method: "PATCH",
            url: item.clone(),
            public: false,
        },
        ApiHint {
            method: "DELETE",
            url: item,
            public: false,
        },
    ]
}

// =============================================================================
// Display helpers
// =============================================================================

/// `July 4th, 2024`
#[must_use]
pub fn long_date(at: &DateTime<Utc>) -> String {
    let day = at.day();
    let suffix = match (day % 10, day % 100) {
        (1, n) if n != 11 => "st",
        (2, n) if n != 12 => "nd",
        (3, n) if n != 13 => "rd",
        _ => "th",
    };
    format!("{} {day}{suffix}, {}", at.format("%B"), at.year())
}

/// `$12.50`
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use storekeep_core::UserId;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::parse("user_1").expect("valid"),
            email: None,
            name: Some("Ada".to_owned()),
        }
    }

    fn store(name: &str) -> Store {
        let now = Utc::now();
        Store {
            id: StoreId::generate(),
            name: name.to_owned(),
            user_id: UserId::parse("user_1").expect("valid"),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_form_heading() {
        let create = FormHeading::new("size", false);
        assert_eq!(create.title, "Create size");
        assert_eq!(create.description, "Add a new size");
        assert_eq!(create.button, "Create");

        let edit = FormHeading::new("size", true);
        assert_eq!(edit.title, "Edit size");
        assert_eq!(edit.description, "Edit a size");
        assert_eq!(edit.button, "Save changes");
    }

    #[test]
    fn test_api_hints() {
        let id = StoreId::generate();
        let hints = api_hints("https://admin.example/", id, "sizes", "sizeId");
        assert_eq!(hints.len(), 5);
        assert_eq!(hints[0].url, format!("https://admin.example/api/{id}/sizes"));
        assert_eq!(hints[1].url, format!("https://admin.example/api/{id}/sizes/{{sizeId}}"));
        assert!(hints[1].public);
        assert_eq!(hints[3].method, "PATCH");
        assert_eq!(hints[4].access(), "Admin");
    }

    #[test]
    fn test_long_date_ordinals() {
        let at = |d| Utc.with_ymd_and_hms(2024, 7, d, 12, 0, 0).single().expect("date");
        assert_eq!(long_date(&at(1)), "July 1st, 2024");
        assert_eq!(long_date(&at(2)), "July 2nd, 2024");
        assert_eq!(long_date(&at(3)), "July 3rd, 2024");
        assert_eq!(long_date(&at(4)), "July 4th, 2024");
        assert_eq!(long_date(&at(11)), "July 11th, 2024");
        assert_eq!(long_date(&at(12)), "July 12th, 2024");
        assert_eq!(long_date(&at(22)), "July 22nd, 2024");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(Decimal::new(1250, 2)), "$12.50");
        assert_eq!(money(Decimal::new(7, 0)), "$7.00");
    }

    #[test]
    fn test_shell_nav_marks_active_section() {
        let current = store("Shoes");
        let other = store("Hats");
        let sizes = format!("/{}/sizes/new", current.id);
        let shell = Shell::build(
            user(),
            Some(current.clone()),
            &[current.clone(), other],
            None,
            &sizes,
        );

        assert_eq!(shell.store_name(), "Shoes");
        assert_eq!(shell.stores.len(), 2);
        assert!(shell.stores[0].active);
        assert!(!shell.stores[1].active);

        let active: Vec<_> = shell.nav.iter().filter(|l| l.active).map(|l| l.label).collect();
        assert_eq!(active, vec!["Sizes"]);
    }

    #[test]
    fn test_shell_without_store_has_no_nav() {
        let shell = Shell::build(user(), None, &[], None, "/");
        assert!(shell.nav.is_empty());
        assert_eq!(shell.store_name(), "Select a store");
    }
}
