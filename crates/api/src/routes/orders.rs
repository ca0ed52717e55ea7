//! Order routes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use camellia_core::{OrderId, OrderStatus};
use serde::Deserialize;
use tracing::instrument;

use super::Page;
use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{NewOrder, Order};
use crate::state::AppState;

/// Create the order routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(index).post(create))
        .route("/api/orders/{id}/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    status: OrderStatus,
}

/// Place an order from explicit lines, decrementing stock atomically.
#[instrument(skip(state, user, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<NewOrder>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .place(user.id, &body.items, &body.shipping_address)
        .await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.id,
        total = %order.total_price,
        "order placed"
    );
    Ok(Json(order))
}

/// List orders: admins see every order, everyone else their own.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Order>>> {
    let repo = OrderRepository::new(state.pool());
    let orders = if user.is_admin {
        repo.list_all(page.skip(), page.limit()).await?
    } else {
        repo.list_for_user(user.id, page.skip(), page.limit()).await?
    };
    Ok(Json(orders))
}

/// Advance an order's status. Backwards moves are rejected.
#[instrument(skip(state, _admin))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), body.status)
        .await?;

    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");
    Ok(Json(order))
}
