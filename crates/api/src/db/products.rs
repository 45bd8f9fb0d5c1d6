//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use instashop_core::{CurrencyCode, Price, ProductId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewProduct, Product};

pub(super) const PRODUCT_COLUMNS: &str = "id, product_code, product_name, product_description, \
                                          price, currency, stock, user_id, created_at, updated_at";

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: i32,
    product_code: String,
    product_name: String,
    product_description: String,
    price: Decimal,
    currency: String,
    stock: i32,
    user_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let currency = CurrencyCode::parse(&row.currency).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid currency in database: {e}"))
        })?;
        let price = Price::new(row.price, currency).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative stock in database: {}", row.stock))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            code: row.product_code,
            name: row.product_name,
            description: row.product_description,
            price,
            stock,
            owner: UserId::new(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a stock level to the `INTEGER` column type.
pub(super) fn stock_to_i32(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock)
        .map_err(|_| RepositoryError::Conflict(format!("stock {stock} exceeds column range")))
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live product by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored column is invalid.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM instashop.product \
             WHERE product_code = $1 AND is_deleted = FALSE"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a product owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        owner: UserId,
        code: &str,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO instashop.product \
                 (product_code, product_name, product_description, price, currency, stock, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.price.currency().as_str())
        .bind(stock_to_i32(product.stock)?)
        .bind(owner)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product code"))?;

        Product::try_from(row)
    }

    /// Replace a live product's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        code: &str,
        product: &NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE instashop.product \
             SET product_name = $2, product_description = $3, price = $4, currency = $5, \
                 stock = $6, updated_at = NOW() \
             WHERE product_code = $1 AND is_deleted = FALSE \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.price.currency().as_str())
        .bind(stock_to_i32(product.stock)?)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Soft-delete a live product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn soft_delete(&self, code: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE instashop.product SET is_deleted = TRUE, updated_at = NOW() \
             WHERE product_code = $1 AND is_deleted = FALSE",
        )
        .bind(code)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
