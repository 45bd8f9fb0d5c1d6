//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Liveness check
//! GET  /health/ready                            - Readiness check (database)
//!
//! # Auth (strict rate limit)
//! POST /api/v1/user/signup                      - Register a customer
//! POST /api/v1/user/login                       - Issue a bearer token
//!
//! # Customer (bearer token)
//! GET  /api/v1/user/product/{product_code}      - Product detail
//! POST /api/v1/user/order                       - Place an order
//! GET  /api/v1/user/order                       - List own orders
//! PUT  /api/v1/user/order/{order_reference}/cancel - Cancel a pending order
//!
//! # Admin (bearer token with admin role)
//! POST   /api/v1/admin/product                  - Create a product
//! PUT    /api/v1/admin/product/{product_code}   - Update a product
//! DELETE /api/v1/admin/product/{product_code}   - Soft-delete a product
//! PUT    /api/v1/admin/order/{order_reference}/status - Change order status
//! ```

pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the signup/login routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
}

/// Create the customer routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/product/{product_code}", get(products::show))
        .route("/order", post(orders::place).get(orders::list))
        .route("/order/{order_reference}/cancel", put(orders::cancel))
        .layer(api_rate_limiter())
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(products::create))
        .route(
            "/product/{product_code}",
            put(products::update).delete(products::delete),
        )
        .route("/order/{order_reference}/status", put(orders::set_status))
        .layer(api_rate_limiter())
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/user", auth_routes().merge(user_routes()))
        .nest("/api/v1/admin", admin_routes())
}
