//! Validation schemas for store and catalog forms.
//!
//! Each form deserializes with every field optional (the same struct accepts
//! the JSON API body and the dashboard's urlencoded form), then validates into
//! the typed `*Input` the repositories take. Presence means non-empty after
//! trimming.
//!
//! The API answers with the first error; the dashboard shows all of them next
//! to their fields.

use serde::Deserialize;

use storekeep_core::{BillboardId, CategoryId, ColorId, HexColor, Price, SizeId};

use crate::models::{
    BillboardInput, CategoryInput, ColorInput, ProductInput, SizeInput, StoreInput,
};

/// One message per failing field, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(&'static str, String)>,
}

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    /// Add a failure found after schema validation, such as a reference to
    /// a record in another store.
    #[must_use]
    pub fn with(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, msg)| msg.as_str())
    }

    /// Message for a field, or an empty string (template convenience).
    #[must_use]
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    /// The first failure, used as the API's 400 body.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.errors.first().map(|(_, msg)| msg.as_str())
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&String>,
    message: &'static str,
) -> Option<String> {
    let value = present(value);
    if value.is_none() {
        errors.push(field, message);
    }
    value
}

fn required_id<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&String>,
    label: &'static str,
) -> Option<T> {
    let Some(raw) = present(value) else {
        errors.push(field, format!("{label} is required"));
        return None;
    };
    raw.parse()
        .map_err(|_| errors.push(field, format!("{label} is invalid")))
        .ok()
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreForm {
    pub name: Option<String>,
}

impl StoreForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<StoreInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", self.name.as_ref(), "Name is required");
        errors.into_result(|| StoreInput {
            name: name.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Billboard
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillboardForm {
    pub label: Option<String>,
    pub image_url: Option<String>,
}

impl BillboardForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(
        &self,
        accepts_image: impl Fn(&str) -> bool,
    ) -> Result<BillboardInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let label = required(&mut errors, "label", self.label.as_ref(), "Label is required");
        let image_url = required(
            &mut errors,
            "imageUrl",
            self.image_url.as_ref(),
            "Image URL is required",
        );
        if let Some(url) = &image_url
            && !accepts_image(url)
        {
            errors.push("imageUrl", "Image URL must be an uploaded https image");
        }

        errors.into_result(|| BillboardInput {
            label: label.unwrap_or_default(),
            image_url: image_url.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryForm {
    pub name: Option<String>,
    pub billboard_id: Option<String>,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<CategoryInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", self.name.as_ref(), "Name is required");
        let billboard_id: Option<BillboardId> =
            required_id(&mut errors, "billboardId", self.billboard_id.as_ref(), "Billboard Id");

        match (name, billboard_id) {
            (Some(name), Some(billboard_id)) if errors.is_empty() => {
                Ok(CategoryInput { name, billboard_id })
            }
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Size
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeForm {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl SizeForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<SizeInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", self.name.as_ref(), "Name is required");
        let value = required(&mut errors, "value", self.value.as_ref(), "Value is required");
        errors.into_result(|| SizeInput {
            name: name.unwrap_or_default(),
            value: value.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Color
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorForm {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl ColorForm {
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<ColorInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", self.name.as_ref(), "Name is required");
        let value = required(&mut errors, "value", self.value.as_ref(), "Value is required")
            .and_then(|raw| {
                HexColor::parse(&raw)
                    .map_err(|_| errors.push("value", "Value must be a valid hex color"))
                    .ok()
            });

        match (name, value) {
            (Some(name), Some(value)) if errors.is_empty() => Ok(ColorInput { name, value }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// `{ "url": "..." }`, the shape the original image uploader produced.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// A number or a numeric string (JSON clients send either for `price`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    /// The amount as typed (numbers in their JSON form).
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Product body as sent to the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<Amount>,
    pub category_id: Option<String>,
    pub size_id: Option<String>,
    pub color_id: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_archived: bool,
}

/// Product fields as posted by the dashboard's HTML form.
///
/// Image URLs travel in one field, one URL per line; checkboxes are present
/// only when ticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFormFields {
    pub name: Option<String>,
    pub price: Option<String>,
    pub category_id: Option<String>,
    pub size_id: Option<String>,
    pub color_id: Option<String>,
    pub image_urls: Option<String>,
    pub is_featured: Option<String>,
    pub is_archived: Option<String>,
}

impl From<ProductFormFields> for ProductForm {
    fn from(fields: ProductFormFields) -> Self {
        let images = fields
            .image_urls
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|url| ImageRef { url: url.to_owned() })
            .collect();

        Self {
            name: fields.name,
            price: fields.price.map(Amount::Text),
            category_id: fields.category_id,
            size_id: fields.size_id,
            color_id: fields.color_id,
            images,
            is_featured: fields.is_featured.is_some(),
            is_archived: fields.is_archived.is_some(),
        }
    }
}

impl ProductForm {
    /// Image URLs joined one per line, for re-rendering the HTML form.
    #[must_use]
    pub fn image_lines(&self) -> String {
        self.images
            .iter()
            .map(|image| image.url.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(
        &self,
        accepts_image: impl Fn(&str) -> bool,
    ) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = required(&mut errors, "name", self.name.as_ref(), "Name is required");

        let image_urls: Vec<String> = self
            .images
            .iter()
            .map(|image| image.url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .collect();
        if image_urls.is_empty() {
            errors.push("images", "Images are required");
        } else if !image_urls.iter().all(|url| accepts_image(url)) {
            errors.push("images", "Images must be uploaded https images");
        }

        let price_text = self.price.as_ref().map(Amount::as_text);
        let price = required(&mut errors, "price", price_text.as_ref(), "Price is required")
            .and_then(|raw| {
                Price::parse(&raw)
                    .map_err(|e| errors.push("price", format!("Price is invalid: {e}")))
                    .ok()
            });

        let category_id: Option<CategoryId> =
            required_id(&mut errors, "categoryId", self.category_id.as_ref(), "Category Id");
        let color_id: Option<ColorId> =
            required_id(&mut errors, "colorId", self.color_id.as_ref(), "Color Id");
        let size_id: Option<SizeId> =
            required_id(&mut errors, "sizeId", self.size_id.as_ref(), "Size Id");

        match (name, price, category_id, size_id, color_id) {
            (Some(name), Some(price), Some(category_id), Some(size_id), Some(color_id))
                if errors.is_empty() =>
            {
                Ok(ProductInput {
                    name,
                    price,
                    category_id,
                    size_id,
                    color_id,
                    image_urls,
                    is_featured: self.is_featured,
                    is_archived: self.is_archived,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_owned())
    }

    fn any_https(url: &str) -> bool {
        url.starts_with("https://")
    }

    #[test]
    fn test_size_requires_name_then_value() {
        let err = SizeForm::default().validate().unwrap_err();
        assert_eq!(err.first(), Some("Name is required"));
        assert_eq!(err.get("value"), Some("Value is required"));

        let err = SizeForm {
            name: s("Small"),
            value: s("   "),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.first(), Some("Value is required"));
        assert_eq!(err.message("name"), "");
    }

    #[test]
    fn test_size_trims_fields() {
        let input = SizeForm {
            name: s("  Small "),
            value: s(" S"),
        }
        .validate()
        .unwrap();
        assert_eq!(input.name, "Small");
        assert_eq!(input.value, "S");
    }

    #[test]
    fn test_store_name_required() {
        assert_eq!(
            StoreForm { name: s("") }.validate().unwrap_err().first(),
            Some("Name is required")
        );
        assert_eq!(StoreForm { name: s("Shoes") }.validate().unwrap().name, "Shoes");
    }

    #[test]
    fn test_color_value_must_be_hex() {
        let err = ColorForm {
            name: s("Red"),
            value: s("red"),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.first(), Some("Value must be a valid hex color"));

        let input = ColorForm {
            name: s("Red"),
            value: s("#FF0000"),
        }
        .validate()
        .unwrap();
        assert_eq!(input.value.as_str(), "#FF0000");
    }

    #[test]
    fn test_billboard_image_url_rules() {
        let err = BillboardForm {
            label: s("Summer"),
            image_url: None,
        }
        .validate(any_https)
        .unwrap_err();
        assert_eq!(err.first(), Some("Image URL is required"));

        let err = BillboardForm {
            label: s("Summer"),
            image_url: s("http://insecure.example/a.png"),
        }
        .validate(any_https)
        .unwrap_err();
        assert_eq!(err.get("imageUrl"), Some("Image URL must be an uploaded https image"));
    }

    #[test]
    fn test_category_billboard_id() {
        let err = CategoryForm {
            name: s("Shirts"),
            billboard_id: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.first(), Some("Billboard Id is required"));

        let err = CategoryForm {
            name: s("Shirts"),
            billboard_id: s("not-a-uuid"),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.first(), Some("Billboard Id is invalid"));

        let id = BillboardId::generate();
        let input = CategoryForm {
            name: s("Shirts"),
            billboard_id: Some(id.to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.billboard_id, id);
    }

    fn valid_product() -> ProductForm {
        ProductForm {
            name: s("Tee"),
            price: Some(Amount::Number(serde_json::Number::from_f64(19.5).unwrap())),
            category_id: Some(CategoryId::generate().to_string()),
            size_id: Some(SizeId::generate().to_string()),
            color_id: Some(ColorId::generate().to_string()),
            images: vec![ImageRef {
                url: "https://cdn.example/tee.png".to_owned(),
            }],
            is_featured: true,
            is_archived: false,
        }
    }

    #[test]
    fn test_product_valid() {
        let input = valid_product().validate(any_https).unwrap();
        assert_eq!(input.price.display(), "$19.50");
        assert_eq!(input.image_urls, vec!["https://cdn.example/tee.png".to_owned()]);
        assert!(input.is_featured);
    }

    #[test]
    fn test_product_error_order() {
        let err = ProductForm::default().validate(any_https).unwrap_err();
        assert_eq!(err.first(), Some("Name is required"));
        assert_eq!(err.get("images"), Some("Images are required"));
        assert_eq!(err.get("price"), Some("Price is required"));
        assert_eq!(err.get("categoryId"), Some("Category Id is required"));
        assert_eq!(err.get("colorId"), Some("Color Id is required"));
        assert_eq!(err.get("sizeId"), Some("Size Id is required"));

        let mut form = valid_product();
        form.images.clear();
        assert_eq!(
            form.validate(any_https).unwrap_err().first(),
            Some("Images are required")
        );
    }

    #[test]
    fn test_product_price_rules() {
        let mut form = valid_product();
        form.price = Some(Amount::Text("-3".to_owned()));
        let err = form.validate(any_https).unwrap_err();
        assert!(err.first().unwrap().starts_with("Price is invalid"));

        form.price = Some(Amount::Text("4.999".to_owned()));
        assert!(form.validate(any_https).is_err());

        form.price = Some(Amount::Text("10000000000".to_owned()));
        let err = form.validate(any_https).unwrap_err();
        assert_eq!(
            err.get("price"),
            Some("Price is invalid: price cannot exceed 9999999999.99")
        );
    }

    #[test]
    fn test_product_json_body() {
        let body = serde_json::json!({
            "name": "Tee",
            "price": "12.00",
            "categoryId": CategoryId::generate().to_string(),
            "sizeId": SizeId::generate().to_string(),
            "colorId": ColorId::generate().to_string(),
            "images": [{ "url": "https://cdn.example/a.png" }, { "url": "https://cdn.example/b.png" }],
            "isArchived": true
        });
        let form: ProductForm = serde_json::from_value(body).unwrap();
        let input = form.validate(any_https).unwrap();
        assert_eq!(input.image_urls.len(), 2);
        assert!(input.is_archived);
        assert!(!input.is_featured);
    }

    #[test]
    fn test_product_html_fields() {
        let fields = ProductFormFields {
            name: s("Tee"),
            price: s("5"),
            category_id: Some(CategoryId::generate().to_string()),
            size_id: Some(SizeId::generate().to_string()),
            color_id: Some(ColorId::generate().to_string()),
            image_urls: s("https://cdn.example/a.png\r\n\r\n https://cdn.example/b.png \n"),
            is_featured: s("on"),
            is_archived: None,
        };
        let form = ProductForm::from(fields);
        assert_eq!(form.image_lines(), "https://cdn.example/a.png\nhttps://cdn.example/b.png");

        let input = form.validate(any_https).unwrap();
        assert!(input.is_featured);
        assert!(!input.is_archived);
    }
}
