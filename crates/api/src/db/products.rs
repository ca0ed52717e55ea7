//! Product repository.
//!
//! Catalog reads are public; writes go through the admin routes. Stock is
//! read here for display and advisory checks only; the authoritative
//! decrement happens in [`super::orders`] at checkout.

use camellia_core::ProductId;
use sqlx::SqlitePool;

use super::{RepositoryError, encode_string_list, parse_price, parse_string_list};
use crate::models::{NewProduct, Product, ProductPatch};

/// Database row for the products table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub stock: i64,
    pub images: String,
    pub sizes: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            title: row.title,
            description: row.description,
            price: parse_price(&row.price)?,
            category: row.category,
            stock: row.stock,
            images: parse_string_list(&row.images, "images")?,
            sizes: parse_string_list(&row.sizes, "sizes")?,
        })
    }
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new product and return it.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (title, description, price, category, stock, images, sizes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, title, description, price, category, stock, images, sizes
            ",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price.to_string())
        .bind(&new.category)
        .bind(new.stock)
        .bind(encode_string_list(&new.images)?)
        .bind(encode_string_list(&new.sizes)?)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, stock, images, sizes
            FROM products
            WHERE id = ?1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// List products ordered by ID, with offset/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, stock, images, sizes
            FROM products
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            ",
        )
        .bind(limit.max(0))
        .bind(skip.max(0))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Apply a partial update and return the updated product.
    ///
    /// Absent fields keep their stored values via `COALESCE`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the product does not exist.
    pub async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<Product, RepositoryError> {
        let images = patch.images.as_deref().map(encode_string_list).transpose()?;
        let sizes = patch.sizes.as_deref().map(encode_string_list).transpose()?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                price = COALESCE(?4, price),
                category = COALESCE(?5, category),
                stock = COALESCE(?6, stock),
                images = COALESCE(?7, images),
                sizes = COALESCE(?8, sizes)
            WHERE id = ?1
            RETURNING id, title, description, price, category, stock, images, sizes
            ",
        )
        .bind(id.as_i64())
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.price.map(|p| p.to_string()))
        .bind(patch.category.as_deref())
        .bind(patch.stock)
        .bind(images)
        .bind(sizes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a product.
    ///
    /// Returns `true` if a row was deleted, `false` if the ID did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the product is referenced by
    /// an order; order history keeps its rows.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.as_i64())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by existing orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use camellia_core::Price;

    use super::*;
    use crate::db::testing::{seed_product, seed_user, test_pool};

    fn sample_product() -> NewProduct {
        NewProduct {
            title: "Classic White Tee".to_owned(),
            description: "Soft cotton crew neck".to_owned(),
            price: Price::parse("25.00").unwrap(),
            category: "Tops".to_owned(),
            stock: 100,
            images: vec!["https://cdn.example.com/tee.jpg".to_owned()],
            sizes: vec!["S".to_owned(), "M".to_owned(), "L".to_owned()],
        }
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let created = repo.create(&sample_product()).await.unwrap();
        assert_eq!(created.title, "Classic White Tee");
        assert_eq!(created.price, Price::parse("25.00").unwrap());
        assert_eq!(created.stock, 100);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.sizes, vec!["S", "M", "L"]);
        assert_eq!(fetched.images, vec!["https://cdn.example.com/tee.jpg"]);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let result = repo.get(ProductId::new(999)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);

        for i in 0..5 {
            seed_product(&pool, &format!("Product {i}"), "10.00", 10).await;
        }

        let all = repo.list(0, 100).await.unwrap();
        assert_eq!(all.len(), 5);

        let page = repo.list(2, 2).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Product 2");
        assert_eq!(page[1].title, "Product 3");

        let past_end = repo.list(10, 100).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_present_fields() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);
        let created = repo.create(&sample_product()).await.unwrap();

        let patch = ProductPatch {
            price: Some(Price::parse("30.00").unwrap()),
            stock: Some(42),
            ..ProductPatch::default()
        };
        let updated = repo.update(created.id, &patch).await.unwrap();

        assert_eq!(updated.price, Price::parse("30.00").unwrap());
        assert_eq!(updated.stock, 42);
        // Untouched fields keep their stored values.
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.sizes, created.sizes);
    }

    #[tokio::test]
    async fn test_empty_patch_is_noop() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);
        let created = repo.create(&sample_product()).await.unwrap();

        let updated = repo.update(created.id, &ProductPatch::default()).await.unwrap();
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.stock, created.stock);
    }

    #[tokio::test]
    async fn test_update_missing_returns_not_found() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let result = repo.update(ProductId::new(999), &ProductPatch::default()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_returns_flag() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);
        let created = repo.create(&sample_product()).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_ordered_product_conflicts() {
        let (pool, _dir) = test_pool().await;
        let repo = ProductRepository::new(&pool);

        let user_id = seed_user(&pool, "buyer@example.com").await;
        let product_id = seed_product(&pool, "Ordered Tee", "25.00", 5).await;

        let line = crate::models::OrderLine {
            product_id,
            quantity: 1,
            size: "M".to_owned(),
        };
        crate::db::OrderRepository::new(&pool)
            .place(user_id, &[line], "12 Main St")
            .await
            .unwrap();

        let result = repo.delete(product_id).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        // The product is still there.
        assert!(repo.get(product_id).await.unwrap().is_some());
    }
}
