//! Order models.

use camellia_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A line on a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub size: String,
    /// Unit price captured at checkout.
    pub price: Price,
}

/// A placed order with all of its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: Price,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One requested line at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default = "super::default_size")]
    pub size: String,
}

/// Checkout request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub shipping_address: String,
}
