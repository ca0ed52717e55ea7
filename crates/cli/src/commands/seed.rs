//! Seed the catalog with demo products.
//!
//! # Usage
//!
//! ```bash
//! camellia-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `CAMELLIA_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Seeding is idempotent: products are matched by title, and existing ones
//! are skipped rather than duplicated, so the command is safe to re-run.

use thiserror::Error;

use camellia_api::db::{self, ProductRepository, RepositoryError};
use camellia_api::models::NewProduct;
use camellia_core::{Price, PriceError};

/// A demo catalog entry.
struct DemoProduct {
    title: &'static str,
    description: &'static str,
    price: &'static str,
    category: &'static str,
    stock: i64,
    image: &'static str,
    sizes: &'static [&'static str],
}

const DEMO_CATALOG: &[DemoProduct] = &[
    DemoProduct {
        title: "Classic White Tee",
        description: "A timeless classic. 100% cotton, breathable and comfortable.",
        price: "25.00",
        category: "Tops",
        stock: 100,
        image: "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["S", "M", "L", "XL", "XXL"],
    },
    DemoProduct {
        title: "Floral Summer Dress",
        description: "Lightweight and airy, perfect for hot summer days.",
        price: "55.00",
        category: "Dresses",
        stock: 50,
        image: "https://images.unsplash.com/photo-1572804013309-59a88b7e92f1?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["XS", "S", "M", "L"],
    },
    DemoProduct {
        title: "High-Waist Jeans",
        description: "Flattering high-waist fit with a vintage wash.",
        price: "60.00",
        category: "Bottoms",
        stock: 75,
        image: "https://images.unsplash.com/photo-1541099649105-f69ad21f3246?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["24", "25", "26", "27", "28", "29", "30"],
    },
    DemoProduct {
        title: "Oversized Denim Jacket",
        description: "The perfect layer for any outfit. Rugged and stylish.",
        price: "85.00",
        category: "Outerwear",
        stock: 40,
        image: "https://images.unsplash.com/photo-1523381210434-271e8be1f52b?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["S", "M", "L", "XL"],
    },
    DemoProduct {
        title: "Cozy Knit Sweater",
        description: "Warm and soft, essential for chilly evenings.",
        price: "45.00",
        category: "Tops",
        stock: 60,
        image: "https://images.unsplash.com/photo-1576566588028-4147f3842f27?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["S", "M", "L"],
    },
    DemoProduct {
        title: "Elegant Evening Gown",
        description: "Stunning floor-length gown for special occasions.",
        price: "120.00",
        category: "Dresses",
        stock: 20,
        image: "https://images.unsplash.com/photo-1566174053879-31528523f8ae?ixlib=rb-4.0.3&auto=format&fit=crop&w=800&q=80",
        sizes: &["S", "M", "L", "XL"],
    },
];

/// Errors that can occur during seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A demo price literal failed to parse.
    #[error("Invalid demo price: {0}")]
    Price(#[from] PriceError),
}

/// Insert the demo product catalog.
///
/// # Errors
///
/// Returns an error if environment variables are missing or database
/// operations fail.
pub async fn catalog() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("CAMELLIA_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let products = ProductRepository::new(&pool);

    let mut inserted = 0_u32;
    let mut skipped = 0_u32;

    for item in DEMO_CATALOG {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE title = ?1)")
                .bind(item.title)
                .fetch_one(&pool)
                .await?;

        if exists {
            tracing::info!("Skipped (already exists): {}", item.title);
            skipped += 1;
            continue;
        }

        let new = NewProduct {
            title: item.title.to_owned(),
            description: item.description.to_owned(),
            price: Price::parse(item.price)?,
            category: item.category.to_owned(),
            stock: item.stock,
            images: vec![item.image.to_owned()],
            sizes: item.sizes.iter().map(|&s| s.to_owned()).collect(),
        };

        let product = products.create(&new).await?;
        tracing::info!("Added: {} (id {})", product.title, product.id);
        inserted += 1;
    }

    tracing::info!("Catalog seeding complete!");
    tracing::info!("  Products inserted: {inserted}");
    tracing::info!("  Products skipped (already exist): {skipped}");

    Ok(())
}
