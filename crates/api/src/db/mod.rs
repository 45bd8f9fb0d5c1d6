//! Database operations for the Instashop `PostgreSQL` schema.
//!
//! # Schema: `instashop`
//!
//! ## Tables
//!
//! - `user` - Accounts, credentials and roles
//! - `product` - Catalogue and stock levels (`CHECK (stock >= 0)`)
//! - `order` - Placed orders (reference unique among live rows)
//! - `order_item` - Priced line items of each order
//!
//! Every table carries `is_deleted`. The repositories always filter on it, so
//! soft-deleted rows are invisible to every read.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p instashop-cli -- migrate
//! ```

mod memory;
mod orders;
mod products;
mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use instashop_core::{Email, OrderId, OrderStatus, Page, PageRequest, UserId};

use crate::models::{NewOrder, NewProduct, NewUser, Order, Product, Reservation, User};

pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, duplicate order reference).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A conditional stock decrement found less stock than reserved.
    #[error("insufficient stock for {code}: {available} left")]
    InsufficientStock {
        /// Product code of the reservation that failed.
        code: String,
        /// Stock the product had when the decrement was attempted.
        available: u32,
    },

    /// A reserved product was deleted before the reservation applied.
    #[error("product {code} no longer exists")]
    ProductGone {
        /// Product code of the reservation that failed.
        code: String,
    },
}

/// Map a unique violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Transactional record store consumed by the services.
///
/// Implementations must exclude soft-deleted records from every read, apply
/// [`Store::commit_placement`] atomically, and make
/// [`Store::update_order_status`] conditional on the expected status.
pub trait Store: Send + Sync {
    /// Insert a user.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    fn create_user(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up a user and their password hash by email.
    fn user_credentials(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Look up a user by public identifier.
    fn user_by_public_id(
        &self,
        public_id: Uuid,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert a product under a fresh code.
    fn create_product(
        &self,
        owner: UserId,
        code: String,
        product: NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Look up a live product by code.
    fn product_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Replace a live product's mutable fields. `None` if no such product.
    fn update_product(
        &self,
        code: &str,
        product: NewProduct,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Soft-delete a product. `false` if no live product has this code.
    fn delete_product(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Look up a live order (with its items) by reference.
    fn order_by_reference(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// One page of a user's orders, newest first.
    fn list_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<Order>, RepositoryError>> + Send;

    /// Atomically apply every stock reservation and insert the order in
    /// `Pending` status.
    ///
    /// Fails with [`RepositoryError::InsufficientStock`] if any product can no
    /// longer cover its reservation, [`RepositoryError::ProductGone`] if a
    /// reserved product has been deleted, and [`RepositoryError::Conflict`]
    /// if the reference is taken. On failure nothing is written.
    fn commit_placement(
        &self,
        order: NewOrder,
        reservations: &[Reservation],
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Move an order from `expected` to `next`.
    ///
    /// Returns `None` if the order is no longer in `expected` status.
    fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;
}

/// [`Store`] backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(&user).await
    }

    async fn user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_credentials_by_email(email)
            .await
    }

    async fn user_by_public_id(&self, public_id: Uuid) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_by_public_id(public_id)
            .await
    }

    async fn create_product(
        &self,
        owner: UserId,
        code: String,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool)
            .create(owner, &code, &product)
            .await
    }

    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_code(code).await
    }

    async fn update_product(
        &self,
        code: &str,
        product: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool)
            .update(code, &product)
            .await
    }

    async fn delete_product(&self, code: &str) -> Result<bool, RepositoryError> {
        ProductRepository::new(&self.pool).soft_delete(code).await
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .get_by_reference(reference)
            .await
    }

    async fn list_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .list_for_user(user_id, status, page)
            .await
    }

    async fn commit_placement(
        &self,
        order: NewOrder,
        reservations: &[Reservation],
    ) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool)
            .place(&order, reservations)
            .await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .update_status(id, expected, next)
            .await
    }
}
