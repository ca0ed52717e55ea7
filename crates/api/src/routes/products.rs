//! Catalog routes. Reads are public; writes require an admin token.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use camellia_core::{Price, ProductId};
use tracing::instrument;

use super::Page;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::state::AppState;

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index).post(create))
        .route(
            "/api/products/{id}",
            get(show).put(update).delete(destroy),
        )
}

fn ensure_non_negative_price(price: Price) -> Result<()> {
    if price.is_negative() {
        return Err(AppError::BadRequest("price cannot be negative".to_owned()));
    }
    Ok(())
}

fn ensure_non_negative_stock(stock: i64) -> Result<()> {
    if stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_owned()));
    }
    Ok(())
}

/// List products with pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(page.skip(), page.limit())
        .await?;
    Ok(Json(products))
}

/// Get a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Create a product.
#[instrument(skip(state, _admin))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<NewProduct>,
) -> Result<Json<Product>> {
    ensure_non_negative_price(body.price)?;
    ensure_non_negative_stock(body.stock)?;

    let product = ProductRepository::new(state.pool()).create(&body).await?;
    tracing::info!(product_id = %product.id, title = %product.title, "product created");
    Ok(Json(product))
}

/// Apply a partial update to a product.
#[instrument(skip(state, _admin))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    if let Some(price) = patch.price {
        ensure_non_negative_price(price)?;
    }
    if let Some(stock) = patch.stock {
        ensure_non_negative_stock(stock)?;
    }

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &patch)
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => AppError::NotFound(format!("product {id}")),
            other => AppError::Database(other),
        })?;
    Ok(Json(product))
}

/// Delete a product and return it.
#[instrument(skip(state, _admin))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    repo.delete(product.id).await?;
    tracing::info!(product_id = %product.id, "product deleted");
    Ok(Json(product))
}
