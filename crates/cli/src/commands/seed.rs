//! Seed a demo catalog from a YAML file.
//!
//! The file names one owner (an identity-provider user id) and any number of
//! stores. Child records refer to each other by name within their store, so
//! the file stays readable:
//!
//! ```yaml
//! owner: user_2abc
//! stores:
//!   - name: Demo Store
//!     billboards:
//!       - label: Summer
//!         image_url: https://res.cloudinary.com/demo/image/upload/summer.jpg
//!     categories:
//!       - name: Shirts
//!         billboard: Summer
//!     sizes:
//!       - { name: Small, value: S }
//!     colors:
//!       - { name: Black, value: "#000000" }
//!     products:
//!       - name: Plain tee
//!         price: "19.99"
//!         category: Shirts
//!         size: Small
//!         color: Black
//!         images: [https://res.cloudinary.com/demo/image/upload/tee.jpg]
//!         featured: true
//! ```
//!
//! The whole file is validated before the first insert.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use storekeep_admin::config;
use storekeep_admin::db;
use storekeep_core::{
    BillboardId, CategoryId, ColorId, HexColor, Price, ProductId, SizeId, StoreId, UserId,
};

use super::CommandError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    pub owner: String,
    #[serde(default)]
    pub stores: Vec<StoreSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSeed {
    pub name: String,
    #[serde(default)]
    pub billboards: Vec<BillboardSeed>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub sizes: Vec<OptionSeed>,
    #[serde(default)]
    pub colors: Vec<OptionSeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillboardSeed {
    pub label: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub billboard: String,
}

/// A size or color: display name plus value.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSeed {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub price: String,
    pub category: String,
    pub size: String,
    pub color: String,
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub archived: bool,
}

/// Parse and validate a seed file's contents.
///
/// # Errors
///
/// Returns an error describing the first problem found: bad YAML, an empty
/// name, an unknown reference, an invalid price or color, or an image URL
/// that is not `https`.
pub fn parse(content: &str) -> Result<SeedFile, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;
    UserId::parse(&file.owner).map_err(|e| CommandError::Seed(format!("owner: {e}")))?;
    for store in &file.stores {
        check_store(store)?;
    }
    Ok(file)
}

fn invalid(store: &str, message: impl std::fmt::Display) -> CommandError {
    CommandError::Seed(format!("store {store:?}: {message}"))
}

fn require_name(store: &str, kind: &str, name: &str) -> Result<(), CommandError> {
    if name.trim().is_empty() {
        return Err(invalid(store, format!("{kind} name is required")));
    }
    Ok(())
}

fn require_https(store: &str, url: &str) -> Result<(), CommandError> {
    if url.trim().starts_with("https://") {
        Ok(())
    } else {
        Err(invalid(store, format!("image {url:?} must be an https URL")))
    }
}

fn check_store(store: &StoreSeed) -> Result<(), CommandError> {
    let name = store.name.as_str();
    require_name(name, "store", name)?;

    for billboard in &store.billboards {
        require_name(name, "billboard", &billboard.label)?;
        require_https(name, &billboard.image_url)?;
    }
    for category in &store.categories {
        require_name(name, "category", &category.name)?;
        if !store.billboards.iter().any(|b| b.label == category.billboard) {
            return Err(invalid(
                name,
                format!(
                    "category {:?} uses unknown billboard {:?}",
                    category.name, category.billboard
                ),
            ));
        }
    }
    for size in &store.sizes {
        require_name(name, "size", &size.name)?;
        if size.value.trim().is_empty() {
            return Err(invalid(name, format!("size {:?} needs a value", size.name)));
        }
    }
    for color in &store.colors {
        require_name(name, "color", &color.name)?;
        HexColor::parse(&color.value)
            .map_err(|e| invalid(name, format!("color {:?}: {e}", color.name)))?;
    }
    for product in &store.products {
        require_name(name, "product", &product.name)?;
        Price::parse(&product.price)
            .map_err(|e| invalid(name, format!("product {:?}: {e}", product.name)))?;
        if product.images.is_empty() {
            return Err(invalid(name, format!("product {:?} needs an image", product.name)));
        }
        for url in &product.images {
            require_https(name, url)?;
        }
        let references = [
            (
                "category",
                &product.category,
                store.categories.iter().any(|c| c.name == product.category),
            ),
            (
                "size",
                &product.size,
                store.sizes.iter().any(|s| s.name == product.size),
            ),
            (
                "color",
                &product.color,
                store.colors.iter().any(|c| c.name == product.color),
            ),
        ];
        if let Some((kind, value, _)) = references.iter().find(|(_, _, found)| !*found) {
            return Err(invalid(
                name,
                format!("product {:?} uses unknown {kind} {value:?}", product.name),
            ));
        }
    }
    Ok(())
}

/// Seed the catalog described in `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or if an insert fails.
pub async fn run(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let file = parse(&content)?;
    info!(stores = file.stores.len(), "Seed file validated");

    let database_url = config::database_url_from_env()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let owner = UserId::parse(&file.owner).map_err(|e| CommandError::Seed(e.to_string()))?;
    for store in &file.stores {
        insert_store(&pool, &owner, store).await?;
    }

    info!("Seeding complete");
    Ok(())
}

/// Insert one store and its catalog in a single transaction.
///
/// A failure part-way through leaves nothing behind, so the file can be
/// rerun once the cause is fixed.
async fn insert_store(
    pool: &sqlx::PgPool,
    owner: &UserId,
    seed: &StoreSeed,
) -> Result<(), CommandError> {
    let mut tx = pool.begin().await?;

    let store_id = sqlx::query_scalar::<_, StoreId>(
        r"
        INSERT INTO admin.store (name, user_id)
        VALUES ($1, $2)
        RETURNING id
        ",
    )
    .bind(seed.name.trim())
    .bind(owner.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let mut billboards = HashMap::new();
    for billboard in &seed.billboards {
        let id = sqlx::query_scalar::<_, BillboardId>(
            r"
            INSERT INTO admin.billboard (store_id, label, image_url)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(billboard.label.trim())
        .bind(billboard.image_url.trim())
        .fetch_one(&mut *tx)
        .await?;
        billboards.insert(billboard.label.as_str(), id);
    }

    let mut categories = HashMap::new();
    for category in &seed.categories {
        let billboard_id = *billboards
            .get(category.billboard.as_str())
            .ok_or_else(|| invalid(&seed.name, "billboard missing after insert"))?;
        let id = sqlx::query_scalar::<_, CategoryId>(
            r"
            INSERT INTO admin.category (store_id, billboard_id, name)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(billboard_id)
        .bind(category.name.trim())
        .fetch_one(&mut *tx)
        .await?;
        categories.insert(category.name.as_str(), id);
    }

    let mut sizes = HashMap::new();
    for size in &seed.sizes {
        let id = sqlx::query_scalar::<_, SizeId>(
            r"
            INSERT INTO admin.size (store_id, name, value)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(size.name.trim())
        .bind(size.value.trim())
        .fetch_one(&mut *tx)
        .await?;
        sizes.insert(size.name.as_str(), id);
    }

    let mut colors = HashMap::new();
    for color in &seed.colors {
        let value = HexColor::parse(&color.value).map_err(|e| invalid(&seed.name, e))?;
        let id = sqlx::query_scalar::<_, ColorId>(
            r"
            INSERT INTO admin.color (store_id, name, value)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(color.name.trim())
        .bind(value.as_str())
        .fetch_one(&mut *tx)
        .await?;
        colors.insert(color.name.as_str(), id);
    }

    for product in &seed.products {
        let missing = || invalid(&seed.name, format!("references of {:?}", product.name));
        let price = Price::parse(&product.price).map_err(|e| invalid(&seed.name, e))?;
        let category_id = *categories.get(product.category.as_str()).ok_or_else(missing)?;
        let size_id = *sizes.get(product.size.as_str()).ok_or_else(missing)?;
        let color_id = *colors.get(product.color.as_str()).ok_or_else(missing)?;
        let image_urls: Vec<String> = product.images.iter().map(|u| u.trim().to_owned()).collect();

        let product_id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO admin.product
                (store_id, category_id, size_id, color_id, name, price, is_featured, is_archived)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(store_id)
        .bind(category_id)
        .bind(size_id)
        .bind(color_id)
        .bind(product.name.trim())
        .bind(price.amount())
        .bind(product.featured)
        .bind(product.archived)
        .fetch_one(&mut *tx)
        .await?;

        // Same-transaction NOW() is constant; the offset keeps file order.
        sqlx::query(
            r"
            INSERT INTO admin.image (product_id, url, created_at)
            SELECT $1, u.url, NOW() + (u.ord * INTERVAL '1 microsecond')
            FROM unnest($2::text[]) WITH ORDINALITY AS u(url, ord)
            ",
        )
        .bind(product_id)
        .bind(&image_urls)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        store = %seed.name,
        store_id = %store_id,
        billboards = seed.billboards.len(),
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Store seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r##"
owner: user_2abc
stores:
  - name: Demo Store
    billboards:
      - label: Summer
        image_url: https://res.cloudinary.com/demo/image/upload/summer.jpg
    categories:
      - name: Shirts
        billboard: Summer
    sizes:
      - { name: Small, value: S }
    colors:
      - { name: Black, value: "#000000" }
    products:
      - name: Plain tee
        price: "19.99"
        category: Shirts
        size: Small
        color: Black
        images: [https://res.cloudinary.com/demo/image/upload/tee.jpg]
        featured: true
"##;

    fn error_of(yaml: &str) -> String {
        parse(yaml).expect_err("should be rejected").to_string()
    }

    #[test]
    fn test_parses_demo_catalog() {
        let file = parse(DEMO).expect("valid seed");
        assert_eq!(file.owner, "user_2abc");
        let store = file.stores.first().expect("one store");
        assert_eq!(store.products.len(), 1);
        assert!(store.products.first().is_some_and(|p| p.featured && !p.archived));
    }

    #[test]
    fn test_rejects_unknown_billboard() {
        let yaml = DEMO.replace("billboard: Summer", "billboard: Winter");
        assert!(error_of(&yaml).contains("unknown billboard \"Winter\""));
    }

    #[test]
    fn test_rejects_unknown_product_reference() {
        let yaml = DEMO.replace("size: Small", "size: Large");
        assert!(error_of(&yaml).contains("unknown size \"Large\""));
    }

    #[test]
    fn test_rejects_bad_color_and_price() {
        assert!(error_of(&DEMO.replace("\"#000000\"", "black")).contains("color \"Black\""));
        assert!(error_of(&DEMO.replace("\"19.99\"", "\"free\"")).contains("product \"Plain tee\""));
    }

    #[test]
    fn test_rejects_price_beyond_column_range() {
        let yaml = DEMO.replace("\"19.99\"", "\"10000000000\"");
        assert!(error_of(&yaml).contains("price cannot exceed"));
    }

    #[test]
    fn test_rejects_plain_http_images() {
        let yaml = DEMO.replace(
            "https://res.cloudinary.com/demo/image/upload/tee.jpg",
            "http://example.com/tee.jpg",
        );
        assert!(error_of(&yaml).contains("must be an https URL"));
    }

    #[test]
    fn test_rejects_blank_owner_and_unknown_fields() {
        assert!(error_of(&DEMO.replace("owner: user_2abc", "owner: \"\"")).contains("owner"));
        assert!(parse(&DEMO.replace("featured: true", "featured: true\n        stock: 3")).is_err());
    }

    #[tokio::test]
    #[ignore = "requires a migrated Postgres database (ADMIN_DATABASE_URL)"]
    async fn test_failed_store_leaves_no_rows() {
        let database_url = config::database_url_from_env().expect("database url");
        let pool = db::create_pool(&database_url).await.expect("pool");
        sqlx::migrate!("../admin/migrations")
            .run(&pool)
            .await
            .expect("migrations");

        let owner = UserId::parse(&format!(
            "user_seed_{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
        .expect("valid owner");
        let mut file = parse(DEMO).expect("valid seed");
        let store = file.stores.first_mut().expect("one store");
        for product in &mut store.products {
            product.category = "Vanished".to_owned();
        }

        assert!(insert_store(&pool, &owner, store).await.is_err());

        let stores: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin.store WHERE user_id = $1")
                .bind(owner.as_str())
                .fetch_one(&pool)
                .await
                .expect("count");
        assert_eq!(stores, 0);
    }
}
