//! Integration tests for the catalog API.
//!
//! Catalog reads are public; every write requires an admin bearer token.

use reqwest::StatusCode;
use serde_json::{Value, json};

use camellia_integration_tests::TestContext;

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("parse error body");
    body["error"].as_str().expect("error field").to_owned()
}

// ============================================================================
// Service Endpoints
// ============================================================================

#[tokio::test]
async fn test_root_and_health_endpoints() {
    let ctx = TestContext::spawn().await;

    let resp = ctx.client.get(ctx.url("/")).send().await.expect("get root");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse root");
    assert_eq!(body["message"], "Welcome to the Camellia API");

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .send()
        .await
        .expect("get health");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("health body"), "ok");

    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .expect("get readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_product_crud_roundtrip() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;

    let id = ctx.create_product(&admin, "Linen Shirt", "35.00", 10).await;

    // Reads are public.
    let resp = ctx
        .client
        .get(ctx.url("/api/products"))
        .send()
        .await
        .expect("list products");
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Vec<Value> = resp.json().await.expect("parse product list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "Linen Shirt");

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("get product");
    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.expect("parse product");
    assert_eq!(product["price"], "35.00");
    assert_eq!(product["stock"], 10);
    assert_eq!(product["sizes"], json!(["S", "M", "L"]));

    // Partial update changes only the named fields.
    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/products/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "price": "39.00" }))
        .send()
        .await
        .expect("patch product");
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Value = resp.json().await.expect("parse patched product");
    assert_eq!(patched["price"], "39.00");
    assert_eq!(patched["title"], "Linen Shirt");
    assert_eq!(patched["stock"], 10);

    // Delete returns the removed product, then the id is gone.
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/products/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("delete product");
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = resp.json().await.expect("parse deleted product");
    assert_eq!(deleted["title"], "Linen Shirt");

    let resp = ctx
        .client
        .get(ctx.url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("get deleted product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, format!("product {id} not found"));
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let ctx = TestContext::spawn().await;

    let resp = ctx
        .client
        .get(ctx.url("/api/products/9999"))
        .send()
        .await
        .expect("get unknown product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, "product 9999 not found");
}

#[tokio::test]
async fn test_product_list_pagination() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;

    ctx.create_product(&admin, "First", "10.00", 1).await;
    let second = ctx.create_product(&admin, "Second", "20.00", 2).await;
    ctx.create_product(&admin, "Third", "30.00", 3).await;

    let resp = ctx
        .client
        .get(ctx.url("/api/products?skip=1&limit=1"))
        .send()
        .await
        .expect("list page");
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Vec<Value> = resp.json().await.expect("parse page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"].as_i64(), Some(second));
}

// ============================================================================
// Authorization & Validation
// ============================================================================

#[tokio::test]
async fn test_product_writes_require_admin() {
    let ctx = TestContext::spawn().await;

    // Anonymous callers are turned away before validation.
    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .json(&json!({ "title": "Sneaky", "price": "1.00" }))
        .send()
        .await
        .expect("anonymous create");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Customers hold real tokens but are still not admins.
    let customer = ctx
        .signup_user("shopper@example.com", "+15550007777", "a-strong-password")
        .await;
    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .bearer_auth(&customer)
        .json(&json!({ "title": "Sneaky", "price": "1.00" }))
        .send()
        .await
        .expect("customer create");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(resp).await, "admin access required");

    let resp = ctx
        .client
        .delete(ctx.url("/api/products/1"))
        .bearer_auth(&customer)
        .send()
        .await
        .expect("customer delete");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_product_validation_rejects_negatives() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;

    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Bad", "price": "-5.00" }))
        .send()
        .await
        .expect("create with negative price");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "price cannot be negative");

    let resp = ctx
        .client
        .post(ctx.url("/api/products"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Bad", "price": "5.00", "stock": -1 }))
        .send()
        .await
        .expect("create with negative stock");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "stock cannot be negative");
}
