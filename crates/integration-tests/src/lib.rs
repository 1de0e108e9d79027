//! Integration tests for Storekeep.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server with the same IDENTITY_JWT_SECRET
//! cargo run -p storekeep-cli -- migrate
//! cargo run -p storekeep-admin
//!
//! # Run the ignored end-to-end tests
//! cargo test -p storekeep-integration-tests -- --ignored
//! ```
//!
//! Requests authenticate with bearer tokens signed by the shared identity
//! secret, the same way a storefront's admin tooling would.

#![cfg_attr(not(test), forbid(unsafe_code))]

use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde_json::Value;
use storekeep_admin::config::IdentityConfig;
use storekeep_admin::services::{IdentityVerifier, SessionClaims};

/// Base URL for the admin server (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3001".to_string())
        .trim_end_matches('/')
        .to_owned()
}

/// HTTP client plus a signed identity for one test user.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub user_id: String,
    token: String,
}

impl TestContext {
    /// A context for a fresh random user, so tests never share stores.
    ///
    /// # Panics
    ///
    /// Panics if `IDENTITY_JWT_SECRET` is not set or the client cannot be built.
    #[must_use]
    pub fn new() -> Self {
        Self::for_user(format!("user_it_{}", uuid::Uuid::new_v4().simple()))
    }

    /// A context signed in as `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if `IDENTITY_JWT_SECRET` is not set or the client cannot be built.
    #[must_use]
    pub fn for_user(user_id: String) -> Self {
        let _ = dotenvy::dotenv();
        let secret = std::env::var("IDENTITY_JWT_SECRET")
            .expect("IDENTITY_JWT_SECRET must match the running server");
        let issuer = std::env::var("IDENTITY_ISSUER").ok().filter(|v| !v.is_empty());

        let verifier = IdentityVerifier::new(&IdentityConfig {
            sign_in_url: url::Url::parse("https://accounts.invalid/sign-in").expect("url"),
            sign_out_url: None,
            jwt_secret: SecretString::from(secret),
            issuer: issuer.clone(),
        });
        let mut claims = SessionClaims::new(&user_id, chrono::Utc::now().timestamp(), 600);
        claims.iss = issuer;
        let token = verifier.issue(&claims).expect("sign token");

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: admin_base_url(),
            user_id,
            token,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attach this context's bearer token.
    #[must_use]
    pub fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// Create a store over the API and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the response has no id.
    pub async fn create_store(&self, name: &str) -> String {
        let body = self
            .post_json("/api/stores", &serde_json::json!({ "name": name }))
            .await;
        id_of(&body)
    }

    /// POST JSON with the bearer token, expecting 200, and return the body.
    ///
    /// # Panics
    ///
    /// Panics on transport errors or a non-200 status.
    pub async fn post_json(&self, path: &str, body: &Value) -> Value {
        let response = self
            .authed(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .expect("request");
        let status = response.status();
        let text = response.text().await.expect("body");
        assert_eq!(status, reqwest::StatusCode::OK, "POST {path}: {text}");
        serde_json::from_str(&text).expect("json body")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The `id` field of an API response.
///
/// # Panics
///
/// Panics if `id` is missing or not a string.
#[must_use]
pub fn id_of(body: &Value) -> String {
    body.get("id")
        .and_then(Value::as_str)
        .expect("response has an id")
        .to_owned()
}
