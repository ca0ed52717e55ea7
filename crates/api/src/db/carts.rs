//! Cart repository.
//!
//! Each user has at most one cart, created lazily on first access. Lines
//! are keyed by (product, size); adding an existing variant merges
//! quantities through the upsert instead of creating a second row.

use camellia_core::{CartId, CartItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use super::{RepositoryError, parse_price, parse_string_list};
use crate::models::{Cart, CartItem, Product};

/// Errors from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be positive when adding.
    #[error("quantity must be positive (got {0})")]
    InvalidQuantity(i64),

    /// Underlying repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Database row for the carts table.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Joined row for a cart line and its product.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    product_id: i64,
    size: String,
    quantity: i64,
    title: String,
    description: String,
    price: String,
    category: String,
    stock: i64,
    images: String,
    sizes: String,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            size: row.size,
            quantity: row.quantity,
            product: Product {
                id: ProductId::new(row.product_id),
                title: row.title,
                description: row.description,
                price: parse_price(&row.price)?,
                category: row.category,
                stock: row.stock,
                images: parse_string_list(&row.images, "images")?,
                sizes: parse_string_list(&row.sizes, "sizes")?,
            },
        })
    }
}

/// Repository for user carts.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one if none exists.
    ///
    /// Safe to call concurrently: the user_id uniqueness makes the insert
    /// a no-op for everyone but the first caller.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart_id = self.ensure_cart(user_id).await?;
        self.load(cart_id).await
    }

    /// Add `quantity` of a product variant, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for non-positive quantities
    /// and `Repository(NotFound)` if the product does not exist.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let cart_id = self.ensure_cart(user_id).await?;

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, size, quantity)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (cart_id, product_id, size)
            DO UPDATE SET quantity = quantity + excluded.quantity
            ",
        )
        .bind(cart_id.as_i64())
        .bind(product_id.as_i64())
        .bind(size)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return CartError::Repository(RepositoryError::NotFound);
            }
            CartError::Repository(RepositoryError::Database(e))
        })?;

        self.touch(cart_id).await?;
        Ok(self.load(cart_id).await?)
    }

    /// Set the quantity of a line, removing it when `quantity <= 0`.
    ///
    /// Updating a line that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn update_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        quantity: i64,
    ) -> Result<Cart, RepositoryError> {
        let cart_id = self.ensure_cart(user_id).await?;

        let result = if quantity <= 0 {
            sqlx::query(
                "DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2 AND size = ?3",
            )
            .bind(cart_id.as_i64())
            .bind(product_id.as_i64())
            .bind(size)
            .execute(self.pool)
            .await?
        } else {
            sqlx::query(
                r"
                UPDATE cart_items
                SET quantity = ?4
                WHERE cart_id = ?1 AND product_id = ?2 AND size = ?3
                ",
            )
            .bind(cart_id.as_i64())
            .bind(product_id.as_i64())
            .bind(size)
            .bind(quantity)
            .execute(self.pool)
            .await?
        };

        if result.rows_affected() > 0 {
            self.touch(cart_id).await?;
        }
        self.load(cart_id).await
    }

    /// Remove a line from the cart. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
    ) -> Result<Cart, RepositoryError> {
        let cart_id = self.ensure_cart(user_id).await?;

        let result = sqlx::query(
            "DELETE FROM cart_items WHERE cart_id = ?1 AND product_id = ?2 AND size = ?3",
        )
        .bind(cart_id.as_i64())
        .bind(product_id.as_i64())
        .bind(size)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.touch(cart_id).await?;
        }
        self.load(cart_id).await
    }

    /// Remove every line from the cart. The cart row itself stays.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart_id = self.ensure_cart(user_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() > 0 {
            self.touch(cart_id).await?;
        }
        self.load(cart_id).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn ensure_cart(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (user_id, created_at, updated_at)
            VALUES (?1, ?2, ?2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id.as_i64())
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
            .bind(user_id.as_i64())
            .fetch_one(self.pool)
            .await?;

        Ok(CartId::new(id))
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(cart_id.as_i64())
            .bind(Utc::now())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn load(&self, cart_id: CartId) -> Result<Cart, RepositoryError> {
        let cart: CartRow = sqlx::query_as(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE id = ?1",
        )
        .bind(cart_id.as_i64())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let rows: Vec<CartItemRow> = sqlx::query_as(
            r"
            SELECT ci.id, ci.product_id, ci.size, ci.quantity,
                   p.title, p.description, p.price, p.category, p.stock, p.images, p.sizes
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.id
            ",
        )
        .bind(cart_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart {
            id: CartId::new(cart.id),
            user_id: UserId::new(cart.user_id),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
            items,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
