//! Domain models for the dashboard.
//!
//! - [`store`] - The tenant root owned by an identity-provider user
//! - [`catalog`] - Billboards, categories, sizes, colors, products and their images
//! - [`session`] - Identity stored in the session after sign-in

pub mod catalog;
pub mod session;
pub mod store;

pub use catalog::{
    Billboard, BillboardInput, Category, CategoryInput, Color, ColorInput, Product,
    ProductFilter, ProductImage, ProductInput, Size, SizeInput, Swatch,
};
pub use session::{CurrentUser, keys as session_keys};
pub use store::{Store, StoreInput};
