//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{IdentityVerifier, MediaSigner, is_acceptable_image_url};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    identity: IdentityVerifier,
    media: Option<MediaSigner>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Dashboard configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let identity = IdentityVerifier::new(config.identity());
        let media = config.media().map(MediaSigner::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                media,
            }),
        }
    }

    /// Get a reference to the dashboard configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the identity-provider token verifier.
    #[must_use]
    pub fn identity(&self) -> &IdentityVerifier {
        &self.inner.identity
    }

    /// Get the media upload signer, if media uploads are configured.
    #[must_use]
    pub fn media(&self) -> Option<&MediaSigner> {
        self.inner.media.as_ref()
    }

    /// Whether an image URL may be stored on a billboard or product.
    #[must_use]
    pub fn accepts_image_url(&self, url: &str) -> bool {
        is_acceptable_image_url(self.media(), url)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::config::tests::test_config;

    /// State backed by a pool that never connects until a query runs.
    pub(crate) fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/storekeep_test")
            .expect("lazy pool");
        AppState::new(config, pool)
    }

    #[tokio::test]
    async fn test_state_wires_services_from_config() {
        let state = test_state();
        assert!(state.media().is_some());
        assert!(state.accepts_image_url(
            "https://res.cloudinary.com/storekeep-test/image/upload/v1/x.jpg"
        ));
        assert!(!state.accepts_image_url("https://elsewhere.example/x.jpg"));
        assert_eq!(state.config().port, 3001);
    }
}
