//! Database operations for the Camellia SQLite database.
//!
//! Tables:
//! - `users` - accounts (created verified through the OTP signup gate)
//! - `products` - catalog
//! - `carts` / `cart_items` - one open cart per user
//! - `orders` / `order_items` - placed orders with price snapshots
//! - `auth_tokens` - opaque bearer tokens
//!
//! Stock control lives in [`orders`]: the decrement is a single conditional
//! `UPDATE`, never a read followed by a write.

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use camellia_core::Price;
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use carts::{CartError, CartRepository};
pub use orders::{OrderRepository, PlaceOrderError, StatusUpdateError};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Embedded migrations, applied with `camellia-cli migrate run`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is in an invalid state.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Entity not found.
    #[error("entity not found")]
    NotFound,

    /// Constraint violation (duplicate value, referenced row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a connection pool for the given SQLite database URL.
///
/// The database file is created on first use. WAL mode keeps readers from
/// blocking the single writer, and the busy timeout covers short write
/// contention between checkouts.
///
/// # Errors
///
/// Returns an error if the URL is malformed or the connection fails.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Decode a stored decimal string into a [`Price`].
pub(crate) fn parse_price(raw: &str) -> Result<Price, RepositoryError> {
    Price::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid stored price {raw:?}: {e}")))
}

/// Decode a stored JSON array of strings.
pub(crate) fn parse_string_list(raw: &str, column: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} list: {e}")))
}

/// Encode a list of strings for a JSON text column.
pub(crate) fn encode_string_list(list: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(list)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to encode list: {e}")))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for repository tests.

    use camellia_core::{Email, ProductId, UserId};
    use sqlx::SqlitePool;
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use tempfile::TempDir;

    use super::MIGRATOR;
    use crate::models::NewProduct;

    /// Temp-file database with migrations applied.
    ///
    /// The returned [`TempDir`] must stay alive for as long as the pool;
    /// dropping it removes the database file.
    pub async fn test_pool() -> (SqlitePool, TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let options = SqliteConnectOptions::new()
            .filename(dir.path().join("test.db"))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("connect to test database");
        MIGRATOR.run(&pool).await.expect("run migrations");
        (pool, dir)
    }

    pub async fn seed_user(pool: &SqlitePool, email: &str) -> UserId {
        let email = Email::parse(email).expect("valid test email");
        let user = super::UserRepository::new(pool)
            .create_verified(&email, None, "$argon2id$test-hash")
            .await
            .expect("create test user");
        user.id
    }

    pub async fn seed_product(pool: &SqlitePool, title: &str, price: &str, stock: i64) -> ProductId {
        let new = NewProduct {
            title: title.to_owned(),
            description: String::new(),
            price: price.parse().expect("valid test price"),
            category: "Tops".to_owned(),
            stock,
            images: vec![],
            sizes: vec!["S".to_owned(), "M".to_owned(), "L".to_owned()],
        };
        let product = super::ProductRepository::new(pool)
            .create(&new)
            .await
            .expect("create test product");
        product.id
    }
}
