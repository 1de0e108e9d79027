//! Catalog domain types.
//!
//! Every catalog record belongs to exactly one store. The `*Input` types are
//! the validated output of the matching form schema in [`crate::forms`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use storekeep_core::{
    BillboardId, CategoryId, ColorId, HexColor, ImageId, Price, ProductId, SizeId, StoreId,
};

// =============================================================================
// Billboards
// =============================================================================

/// A promotional banner shown at the top of a category page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Billboard {
    pub id: BillboardId,
    pub store_id: StoreId,
    pub label: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillboardInput {
    pub label: String,
    pub image_url: String,
}

// =============================================================================
// Categories
// =============================================================================

/// A product category, displayed with one billboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub store_id: StoreId,
    pub billboard_id: BillboardId,
    /// Label of the linked billboard (joined for list pages).
    pub billboard_label: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub billboard_id: BillboardId,
}

// =============================================================================
// Sizes
// =============================================================================

/// A size option such as "Small" / "S".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub id: SizeId,
    pub store_id: StoreId,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeInput {
    pub name: String,
    pub value: String,
}

// =============================================================================
// Colors
// =============================================================================

/// A color option; `value` is a CSS hex color.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub id: ColorId,
    pub store_id: StoreId,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorInput {
    pub name: String,
    pub value: HexColor,
}

// =============================================================================
// Products
// =============================================================================

/// A hosted product image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Name/value pair of a related size or color, embedded in product responses.
#[derive(Debug, Clone, Serialize)]
pub struct Swatch {
    pub name: String,
    pub value: String,
}

/// A product with its images and the names of its related records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub category_id: CategoryId,
    pub size_id: SizeId,
    pub color_id: ColorId,
    pub name: String,
    pub price: Decimal,
    pub is_featured: bool,
    pub is_archived: bool,
    pub category_name: String,
    pub size: Swatch,
    pub color: Swatch,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub size_id: SizeId,
    pub color_id: ColorId,
    pub image_urls: Vec<String>,
    pub is_featured: bool,
    pub is_archived: bool,
}

/// Filters accepted by the public product listing.
///
/// Archived products are never listed publicly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub size_id: Option<SizeId>,
    pub color_id: Option<ColorId>,
    pub is_featured: Option<bool>,
}
