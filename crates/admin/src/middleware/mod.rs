//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first, see `main.rs`)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Security headers (CSP allowing the media CDN)
//!
//! Authentication is per-handler through the [`RequireUser`] and
//! [`OptionalUser`] extractors.

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireUser, clear_current_user, set_current_user,
};
pub use flash::{Flash, FlashLevel};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
