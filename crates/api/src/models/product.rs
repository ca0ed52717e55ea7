//! Catalog product models.

use camellia_core::{Price, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub stock: i64,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
}

/// Request body for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// Partial update for a product.
///
/// Only fields present in the request change; everything else keeps its
/// stored value. An all-`None` patch is a no-op that still returns the
/// current product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
}
