//! Integration tests for the cart API.
//!
//! Every cart endpoint operates on the calling user's own cart, which is
//! created lazily on first access.

use reqwest::StatusCode;
use serde_json::{Value, json};

use camellia_integration_tests::TestContext;

async fn get_cart(ctx: &TestContext, token: &str) -> Value {
    let resp = ctx
        .client
        .get(ctx.url("/api/cart"))
        .bearer_auth(token)
        .send()
        .await
        .expect("get cart");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("parse cart")
}

async fn add_item(ctx: &TestContext, token: &str, body: Value) -> reqwest::Response {
    ctx.client
        .post(ctx.url("/api/cart/items"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("add cart item")
}

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.expect("parse error body");
    body["error"].as_str().expect("error field").to_owned()
}

// ============================================================================
// Accumulation
// ============================================================================

#[tokio::test]
async fn test_cart_starts_empty_and_merges_lines() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let product = ctx.create_product(&admin, "Wool Socks", "8.00", 50).await;
    let token = ctx
        .signup_user("alice@example.com", "+15550001111", "a-strong-password")
        .await;

    let cart = get_cart(&ctx, &token).await;
    assert_eq!(cart["items"], json!([]));
    let cart_id = cart["id"].as_i64().expect("cart id");

    // Same product and size merges into one line.
    let resp = add_item(&ctx, &token, json!({ "product_id": product, "quantity": 2 })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"].as_array().expect("items").len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["items"][0]["product"]["title"], "Wool Socks");

    let resp = add_item(&ctx, &token, json!({ "product_id": product, "quantity": 3 })).await;
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"].as_array().expect("items").len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 5);

    // A different size is its own line.
    let resp = add_item(
        &ctx,
        &token,
        json!({ "product_id": product, "quantity": 1, "size": "L" }),
    )
    .await;
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"].as_array().expect("items").len(), 2);

    // The cart itself is stable across mutations.
    assert_eq!(cart["id"].as_i64(), Some(cart_id));
}

#[tokio::test]
async fn test_carts_are_isolated_per_user() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let product = ctx.create_product(&admin, "Beanie", "12.00", 30).await;

    let alice = ctx
        .signup_user("alice@example.com", "+15550001111", "a-strong-password")
        .await;
    let bob = ctx
        .signup_user("bob@example.com", "+15550002222", "a-strong-password")
        .await;

    add_item(&ctx, &alice, json!({ "product_id": product, "quantity": 4 })).await;

    let bobs = get_cart(&ctx, &bob).await;
    assert_eq!(bobs["items"], json!([]));

    let alices = get_cart(&ctx, &alice).await;
    assert_eq!(alices["items"][0]["quantity"], 4);
}

// ============================================================================
// Updates & Removal
// ============================================================================

#[tokio::test]
async fn test_cart_update_and_remove_lines() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let product = ctx.create_product(&admin, "Scarf", "15.00", 40).await;
    let token = ctx
        .signup_user("carol@example.com", "+15550003333", "a-strong-password")
        .await;

    add_item(&ctx, &token, json!({ "product_id": product, "quantity": 2 })).await;

    // Set an explicit quantity.
    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/cart/items/{product}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 7 }))
        .send()
        .await
        .expect("update line");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"][0]["quantity"], 7);

    // Zero removes the line entirely.
    let resp = ctx
        .client
        .put(ctx.url(&format!("/api/cart/items/{product}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("zero line");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"], json!([]));

    // Removal targets one size; the other line stays.
    add_item(
        &ctx,
        &token,
        json!({ "product_id": product, "quantity": 1, "size": "M" }),
    )
    .await;
    add_item(
        &ctx,
        &token,
        json!({ "product_id": product, "quantity": 1, "size": "L" }),
    )
    .await;

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/api/cart/items/{product}?size=L")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("remove line");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"].as_array().expect("items").len(), 1);
    assert_eq!(cart["items"][0]["size"], "M");
}

#[tokio::test]
async fn test_clear_empties_the_cart() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let first = ctx.create_product(&admin, "Gloves", "9.00", 20).await;
    let second = ctx.create_product(&admin, "Cap", "11.00", 20).await;
    let token = ctx
        .signup_user("dave@example.com", "+15550004444", "a-strong-password")
        .await;

    add_item(&ctx, &token, json!({ "product_id": first, "quantity": 1 })).await;
    add_item(&ctx, &token, json!({ "product_id": second, "quantity": 2 })).await;

    let resp = ctx
        .client
        .delete(ctx.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("clear cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.expect("parse cart");
    assert_eq!(cart["items"], json!([]));
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_cart_rejects_unknown_product() {
    let ctx = TestContext::spawn().await;
    let token = ctx
        .signup_user("erin@example.com", "+15550005555", "a-strong-password")
        .await;

    let resp = add_item(&ctx, &token, json!({ "product_id": 9999, "quantity": 1 })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(resp).await, "product 9999 not found");
}

#[tokio::test]
async fn test_cart_rejects_quantity_beyond_stock() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let product = ctx.create_product(&admin, "Limited Tee", "25.00", 2).await;
    let token = ctx
        .signup_user("frank@example.com", "+15550006666", "a-strong-password")
        .await;

    let resp = add_item(&ctx, &token, json!({ "product_id": product, "quantity": 5 })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(resp).await,
        format!("not enough stock for product {product}: requested 5, available 2")
    );
}

#[tokio::test]
async fn test_cart_rejects_nonpositive_quantity() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.create_admin("admin@example.com", "a-strong-password").await;
    let product = ctx.create_product(&admin, "Belt", "18.00", 10).await;
    let token = ctx
        .signup_user("grace@example.com", "+15550007777", "a-strong-password")
        .await;

    let resp = add_item(&ctx, &token, json!({ "product_id": product, "quantity": 0 })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "quantity must be positive (got 0)");
}

#[tokio::test]
async fn test_cart_requires_token() {
    let ctx = TestContext::spawn().await;

    let resp = ctx
        .client
        .get(ctx.url("/api/cart"))
        .send()
        .await
        .expect("get cart without token");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(resp).await, "missing bearer token");
}
