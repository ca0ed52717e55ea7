//! Cart routes. Every endpoint operates on the caller's own cart.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use camellia_core::ProductId;
use serde::Deserialize;
use tracing::instrument;

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Cart;
use crate::state::AppState;

/// Create the cart routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show).delete(clear))
        .route("/api/cart/items", post(add_item))
        .route(
            "/api/cart/items/{product_id}",
            axum::routing::put(update_item).delete(remove_item),
        )
}

#[derive(Debug, Deserialize)]
pub struct AddItemBody {
    product_id: i64,
    #[serde(default = "default_quantity")]
    quantity: i64,
    #[serde(default = "crate::models::default_size")]
    size: String,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemBody {
    quantity: i64,
}

/// Size selector for line-level endpoints; defaults to "M" like the
/// add body does.
#[derive(Debug, Deserialize)]
pub struct SizeQuery {
    #[serde(default = "crate::models::default_size")]
    size: String,
}

/// Get the caller's cart, creating it on first access.
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, RequireUser(user): RequireUser) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get_or_create(user.id).await?;
    Ok(Json(cart))
}

/// Add a product variant to the cart.
///
/// The product must exist, and the requested quantity must not exceed
/// current stock. The stock check is advisory; checkout re-validates
/// atomically.
#[instrument(skip(state, user))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemBody>,
) -> Result<Json<Cart>> {
    let product_id = ProductId::new(body.product_id);
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    if body.quantity > 0 && product.stock < body.quantity {
        return Err(AppError::BadRequest(format!(
            "not enough stock for product {product_id}: requested {}, available {}",
            body.quantity, product.stock
        )));
    }

    let cart = CartRepository::new(state.pool())
        .add_item(user.id, product_id, &body.size, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Set a line's quantity; zero or less removes the line.
#[instrument(skip(state, user))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<i64>,
    Query(query): Query<SizeQuery>,
    Json(body): Json<UpdateItemBody>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .update_item(user.id, ProductId::new(product_id), &query.size, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line from the cart.
#[instrument(skip(state, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<i64>,
    Query(query): Query<SizeQuery>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .remove_item(user.id, ProductId::new(product_id), &query.size)
        .await?;
    Ok(Json(cart))
}

/// Remove every line from the cart.
#[instrument(skip(state, user))]
pub async fn clear(State(state): State<AppState>, RequireUser(user): RequireUser) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(cart))
}
