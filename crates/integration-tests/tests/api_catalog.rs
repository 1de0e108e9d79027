//! End-to-end tests for the store-scoped JSON API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`sk-cli migrate`)
//! - The admin server running (cargo run -p storekeep-admin)
//! - `IDENTITY_JWT_SECRET` matching the server's
//!
//! Run with: cargo test -p storekeep-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::json;
use storekeep_integration_tests::{TestContext, id_of};

/// A store with one billboard, category, size and color.
struct Catalog {
    store_id: String,
    billboard_id: String,
    category_id: String,
    size_id: String,
    color_id: String,
}

async fn catalog(ctx: &TestContext) -> Catalog {
    let store_id = ctx.create_store("Integration store").await;

    let billboard = ctx
        .post_json(
            &format!("/api/{store_id}/billboards"),
            &json!({ "label": "Summer", "imageUrl": "https://res.cloudinary.com/demo/image/upload/summer.jpg" }),
        )
        .await;
    let billboard_id = id_of(&billboard);

    let category = ctx
        .post_json(
            &format!("/api/{store_id}/categories"),
            &json!({ "name": "Shirts", "billboardId": billboard_id }),
        )
        .await;
    let size = ctx
        .post_json(
            &format!("/api/{store_id}/sizes"),
            &json!({ "name": "Small", "value": "S" }),
        )
        .await;
    let color = ctx
        .post_json(
            &format!("/api/{store_id}/colors"),
            &json!({ "name": "Black", "value": "#000000" }),
        )
        .await;

    Catalog {
        store_id,
        billboard_id,
        category_id: id_of(&category),
        size_id: id_of(&size),
        color_id: id_of(&color),
    }
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_other_users_cannot_write_to_a_store() {
    let owner = TestContext::new();
    let intruder = TestContext::new();
    let store_id = owner.create_store("Owned").await;

    let response = intruder
        .authed(intruder.client.post(intruder.url(&format!("/api/{store_id}/sizes"))))
        .json(&json!({ "name": "Small", "value": "S" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.text().await.expect("body"), "Unauthorized");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_anonymous_reads_are_public() {
    let ctx = TestContext::new();
    let catalog = catalog(&ctx).await;

    let response = ctx
        .client
        .get(ctx.url(&format!("/api/{}/sizes", catalog.store_id)))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let sizes: serde_json::Value = response.json().await.expect("json");
    assert_eq!(sizes.as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_product_lifecycle_and_filters() {
    let ctx = TestContext::new();
    let catalog = catalog(&ctx).await;
    let store_id = &catalog.store_id;

    let product = ctx
        .post_json(
            &format!("/api/{store_id}/products"),
            &json!({
                "name": "Plain tee",
                "price": "19.99",
                "categoryId": catalog.category_id,
                "sizeId": catalog.size_id,
                "colorId": catalog.color_id,
                "images": [{ "url": "https://res.cloudinary.com/demo/image/upload/tee.jpg" }],
                "isFeatured": true,
                "isArchived": false,
            }),
        )
        .await;
    let product_id = id_of(&product);

    let featured: serde_json::Value = ctx
        .client
        .get(ctx.url(&format!("/api/{store_id}/products?isFeatured=true")))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(featured.as_array().map(Vec::len), Some(1));

    // Archive it: archived products disappear from the public listing
    let response = ctx
        .authed(
            ctx.client
                .patch(ctx.url(&format!("/api/{store_id}/products/{product_id}"))),
        )
        .json(&json!({
            "name": "Plain tee",
            "price": "17.50",
            "categoryId": catalog.category_id,
            "sizeId": catalog.size_id,
            "colorId": catalog.color_id,
            "images": [{ "url": "https://res.cloudinary.com/demo/image/upload/tee.jpg" }],
            "isFeatured": false,
            "isArchived": true,
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let listed: serde_json::Value = ctx
        .client
        .get(ctx.url(&format!("/api/{store_id}/products")))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(listed.as_array().map(Vec::len), Some(0));

    let response = ctx
        .authed(
            ctx.client
                .delete(ctx.url(&format!("/api/{store_id}/products/{product_id}"))),
        )
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Referential integrity
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_referenced_billboard_cannot_be_deleted() {
    let ctx = TestContext::new();
    let catalog = catalog(&ctx).await;

    let response = ctx
        .authed(ctx.client.delete(ctx.url(&format!(
            "/api/{}/billboards/{}",
            catalog.store_id, catalog.billboard_id
        ))))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.text().await.expect("body"),
        "Make sure you removed all categories using this billboard first."
    );
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_children_of_another_store_are_not_found() {
    let ctx = TestContext::new();
    let first = catalog(&ctx).await;
    let second_store = ctx.create_store("Second").await;

    let response = ctx
        .authed(ctx.client.delete(ctx.url(&format!(
            "/api/{second_store}/sizes/{}",
            first.size_id
        ))))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_pages_redirect_to_sign_in_without_a_session() {
    let ctx = TestContext::new();
    let response = ctx.client.get(ctx.url("/")).send().await.expect("request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/sign-in")
    );
}
