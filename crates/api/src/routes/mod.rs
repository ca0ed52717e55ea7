//! HTTP route handlers for the Camellia API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                              - Welcome banner
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (pings the database)
//! GET    /uploads/*                     - Uploaded product images
//!
//! # Catalog
//! GET    /api/products                  - List products (paginated)
//! POST   /api/products                  - Create product (admin)
//! GET    /api/products/{id}             - Product detail
//! PUT    /api/products/{id}             - Partial update (admin)
//! DELETE /api/products/{id}             - Delete product (admin)
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Get or create own cart
//! DELETE /api/cart                      - Clear own cart
//! POST   /api/cart/items                - Add item (merges same variant)
//! PUT    /api/cart/items/{product_id}   - Set line quantity (0 removes)
//! DELETE /api/cart/items/{product_id}   - Remove line
//!
//! # Orders (requires auth)
//! POST   /api/orders                    - Place order from explicit lines
//! GET    /api/orders                    - Own orders; admins see all
//! PUT    /api/orders/{id}/status        - Advance status (admin)
//!
//! # Signup & auth
//! POST   /api/verify/send-email-otp     - Issue email code
//! POST   /api/verify/send-phone-otp     - Issue phone code
//! POST   /api/verify/confirm            - Verify both codes, create account
//! POST   /api/users/token               - Login (form), returns bearer token
//! GET    /api/users/me                  - Current account
//!
//! # Admin
//! POST   /api/upload                    - Upload product images (multipart)
//! ```

pub mod cart;
pub mod orders;
pub mod products;
pub mod upload;
pub mod users;
pub mod verify;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Pagination query parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    #[serde(default)]
    skip: Option<i64>,
    #[serde(default)]
    limit: Option<i64>,
}

impl Page {
    /// Rows to skip; negative values clamp to zero.
    pub(crate) fn skip(self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Page size; defaults to 100, negative values clamp to zero.
    pub(crate) fn limit(self) -> i64 {
        self.limit.unwrap_or(100).max(0)
    }
}

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(products::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(verify::routes())
        .merge(users::routes())
        .merge(upload::routes())
}

/// Create the full application router: API routes, static uploads,
/// health endpoints, tracing and CORS.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config().cors_origins.as_slice());
    let uploads = ServeDir::new(&state.config().upload_dir);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api_routes())
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the Camellia API" }))
}

async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: verifies the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
