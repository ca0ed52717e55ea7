//! Cart models.

use camellia_core::{CartId, CartItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// A cart line with its product joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i64,
    pub product: Product,
}

/// A user's cart with all of its lines.
///
/// `updated_at` moves on every line mutation, `created_at` never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}
