//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `identity` - Session tokens from the external identity provider
//! - `media` - Signed direct uploads to the hosted media service
//! - `ownership` - The store ownership check

pub mod identity;
pub mod media;
pub mod ownership;

pub use identity::{IdentityError, IdentityVerifier, SessionClaims};
pub use media::{MediaSigner, UploadSignature, is_acceptable_image_url};
pub use ownership::require_store_owner;
