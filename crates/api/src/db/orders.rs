//! Order repository.
//!
//! Checkout is the only place stock moves. Each line's decrement is a
//! single conditional `UPDATE ... WHERE stock >= n` inside one
//! transaction, so overselling cannot happen no matter how many checkouts
//! race; the losers see the guard fail and the whole transaction rolls
//! back. Unit prices are copied onto the order lines at this moment and
//! never change afterwards.

use camellia_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use super::{RepositoryError, parse_price};
use crate::models::{Order, OrderItem, OrderLine};

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// A requested product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// A requested line exceeds the available stock.
    #[error("not enough stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// A line quantity was zero or negative.
    #[error("quantity must be positive (got {0})")]
    InvalidQuantity(i64),

    /// The order had no lines.
    #[error("order must contain at least one item")]
    Empty,

    /// Underlying repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from changing an order's status.
#[derive(Debug, Error)]
pub enum StatusUpdateError {
    /// Orders only move forward through the lifecycle.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Underlying repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Database row for the orders table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    total_price: String,
    shipping_address: String,
    created_at: DateTime<Utc>,
}

/// Database row for the order_items table.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    size: String,
    price: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            size: row.size,
            price: parse_price(&row.price)?,
        })
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus, RepositoryError> {
    raw.parse()
        .map_err(|_| RepositoryError::DataCorruption(format!("invalid order status {raw:?}")))
}

fn build_order(row: OrderRow, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: OrderId::new(row.id),
        user_id: UserId::new(row.user_id),
        status: parse_status(&row.status)?,
        total_price: parse_price(&row.total_price)?,
        shipping_address: row.shipping_address,
        created_at: row.created_at,
        items,
    })
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order: decrement stock for every line, snapshot prices,
    /// and insert the order atomically.
    ///
    /// Either every line gets its stock or the transaction rolls back and
    /// no stock moves at all.
    ///
    /// # Errors
    ///
    /// - [`PlaceOrderError::Empty`] / [`PlaceOrderError::InvalidQuantity`]
    ///   for malformed input, checked before any database work
    /// - [`PlaceOrderError::ProductNotFound`] if a line names a missing product
    /// - [`PlaceOrderError::InsufficientStock`] if a line exceeds what is left
    pub async fn place(
        &self,
        user_id: UserId,
        lines: &[OrderLine],
        shipping_address: &str,
    ) -> Result<Order, PlaceOrderError> {
        if lines.is_empty() {
            return Err(PlaceOrderError::Empty);
        }
        if let Some(line) = lines.iter().find(|line| line.quantity <= 0) {
            return Err(PlaceOrderError::InvalidQuantity(line.quantity));
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let now = Utc::now();
        let mut total = Price::ZERO;
        let mut priced_lines = Vec::with_capacity(lines.len());

        for line in lines {
            // Guard and decrement in one statement. A plain read-then-write
            // here would let two checkouts both see enough stock.
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
            )
            .bind(line.quantity)
            .bind(line.product_id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(line.product_id.as_i64())
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(RepositoryError::from)?;

                // Dropping the transaction rolls back earlier decrements.
                return Err(match available {
                    None => PlaceOrderError::ProductNotFound(line.product_id),
                    Some(available) => PlaceOrderError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available,
                    },
                });
            }

            let price_raw: String = sqlx::query_scalar("SELECT price FROM products WHERE id = ?1")
                .bind(line.product_id.as_i64())
                .fetch_one(&mut *tx)
                .await
                .map_err(RepositoryError::from)?;
            let unit_price = parse_price(&price_raw)?;

            total += unit_price.times(line.quantity);
            priced_lines.push((line.product_id, line.quantity, line.size.clone(), unit_price));
        }

        let order_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO orders (user_id, status, total_price, shipping_address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            ",
        )
        .bind(user_id.as_i64())
        .bind(OrderStatus::Pending.to_string())
        .bind(total.to_string())
        .bind(shipping_address)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let mut items = Vec::with_capacity(priced_lines.len());
        for (product_id, quantity, size, price) in priced_lines {
            let item_id: i64 = sqlx::query_scalar(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, size, price)
                VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(product_id.as_i64())
            .bind(quantity)
            .bind(&size)
            .bind(price.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

            items.push(OrderItem {
                id: OrderItemId::new(item_id),
                product_id,
                quantity,
                size,
                price,
            });
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(Order {
            id: OrderId::new(order_id),
            user_id,
            status: OrderStatus::Pending,
            total_price: total,
            shipping_address: shipping_address.to_owned(),
            created_at: now,
            items,
        })
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, status, total_price, shipping_address, created_at
            FROM orders
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, size, price
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            ",
        )
        .bind(id.as_i64())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Some(build_order(row, items)).transpose()
    }

    /// Move an order's status forward.
    ///
    /// The rank comparison runs inside the `UPDATE` itself, so two admins
    /// racing cannot push an order backwards between check and write.
    ///
    /// # Errors
    ///
    /// - `Repository(NotFound)` if the order does not exist
    /// - [`StatusUpdateError::InvalidTransition`] for a backwards move
    pub async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, StatusUpdateError> {
        // The CASE ranks mirror OrderStatus::can_transition_to.
        let updated = sqlx::query(
            r"
            UPDATE orders
            SET status = ?2
            WHERE id = ?1
              AND (CASE status WHEN 'Pending' THEN 0 WHEN 'Shipped' THEN 1 ELSE 2 END)
                  <= (CASE ?2 WHEN 'Pending' THEN 0 WHEN 'Shipped' THEN 1 ELSE 2 END)
            ",
        )
        .bind(id.as_i64())
        .bind(new_status.to_string())
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if updated.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
                    .bind(id.as_i64())
                    .fetch_optional(self.pool)
                    .await
                    .map_err(RepositoryError::from)?;

            return Err(match current {
                None => StatusUpdateError::Repository(RepositoryError::NotFound),
                Some(raw) => StatusUpdateError::InvalidTransition {
                    from: parse_status(&raw)?,
                    to: new_status,
                },
            });
        }

        self.get(id)
            .await?
            .ok_or(StatusUpdateError::Repository(RepositoryError::NotFound))
    }

    /// List one user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, status, total_price, shipping_address, created_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY id DESC
            LIMIT ?2 OFFSET ?3
            ",
        )
        .bind(user_id.as_i64())
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(self.pool)
        .await?;

        let items: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT id, order_id, product_id, quantity, size, price
            FROM order_items
            WHERE order_id IN (
                SELECT id FROM orders
                WHERE user_id = ?1
                ORDER BY id DESC
                LIMIT ?2 OFFSET ?3
            )
            ORDER BY order_id, id
            ",
        )
        .bind(user_id.as_i64())
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(self.pool)
        .await?;

        Self::assemble(rows, items)
    }

    /// List every order across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a query fails.
    pub async fn list_all(&self, skip: i64, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, status, total_price, shipping_address, created_at
            FROM orders
            ORDER BY id DESC
            LIMIT ?1 OFFSET ?2
            ",
        )
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(self.pool)
        .await?;

        let items: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT id, order_id, product_id, quantity, size, price
            FROM order_items
            WHERE order_id IN (
                SELECT id FROM orders ORDER BY id DESC LIMIT ?1 OFFSET ?2
            )
            ORDER BY order_id, id
            ",
        )
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(self.pool)
        .await?;

        Self::assemble(rows, items)
    }

    fn assemble(rows: Vec<OrderRow>, items: Vec<OrderItemRow>) -> Result<Vec<Order>, RepositoryError> {
        let mut by_order: std::collections::HashMap<i64, Vec<OrderItem>> =
            std::collections::HashMap::new();
        for item in items {
            let order_id = item.order_id;
            by_order
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(item)?);
        }

        rows.into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                build_order(row, items)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
