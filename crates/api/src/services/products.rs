//! Product catalogue service.
//!
//! Reads are open to any authenticated principal; writes require an
//! administrator.

use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use instashop_core::{CurrencyCode, CurrencyError, Price, PriceError, Principal};

use crate::db::{RepositoryError, Store};
use crate::models::{NewProduct, Product};

/// Minimum product name length, in characters.
const MIN_NAME_LENGTH: usize = 3;

/// Errors that can occur during product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// No live product has this code.
    #[error("Product not found")]
    NotFound,

    /// The acting principal has no live account.
    #[error("User not found")]
    UserNotFound,

    /// Name shorter than [`MIN_NAME_LENGTH`].
    #[error("product_name must be at least {MIN_NAME_LENGTH} characters")]
    NameTooShort,

    /// Invalid currency code.
    #[error("{0}")]
    Currency(#[from] CurrencyError),

    /// Invalid price.
    #[error("{0}")]
    Price(#[from] PriceError),

    /// Stock must be a non-negative integer.
    #[error("stock must be between 0 and {max}", max = i32::MAX)]
    InvalidStock,

    /// Only administrators may change the catalogue.
    #[error("You do not have the right to access this resource")]
    Forbidden,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Unvalidated product fields as received from a client.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub stock: i64,
}

impl ProductInput {
    fn validate(self) -> Result<NewProduct, ProductError> {
        let name = self.name.trim().to_owned();
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(ProductError::NameTooShort);
        }

        let currency = CurrencyCode::parse(&self.currency)?;
        let price = Price::new(self.price, currency)?;
        let stock = u32::try_from(self.stock)
            .ok()
            .filter(|s| i32::try_from(*s).is_ok())
            .ok_or(ProductError::InvalidStock)?;

        Ok(NewProduct {
            name,
            description: self.description.trim().to_owned(),
            price,
            stock,
        })
    }
}

/// Product service.
pub struct ProductService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> ProductService<'a, S> {
    /// Create a new product service over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Look up a live product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if no live product has this code.
    pub async fn get(&self, code: &str) -> Result<Product, ProductError> {
        self.store
            .product_by_code(code)
            .await?
            .ok_or(ProductError::NotFound)
    }

    /// Create a product owned by the acting administrator.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Forbidden` for a non-admin principal, a
    /// validation error for bad input, and `ProductError::UserNotFound` if
    /// the admin's account no longer exists.
    #[instrument(skip(self, principal, input), fields(user = %principal.identity))]
    pub async fn create(
        &self,
        principal: &Principal,
        input: ProductInput,
    ) -> Result<Product, ProductError> {
        if !principal.is_admin() {
            return Err(ProductError::Forbidden);
        }
        let product = input.validate()?;

        let public_id =
            Uuid::parse_str(&principal.identity).map_err(|_| ProductError::UserNotFound)?;
        let owner = self
            .store
            .user_by_public_id(public_id)
            .await?
            .ok_or(ProductError::UserNotFound)?;

        let created = self
            .store
            .create_product(owner.id, Uuid::new_v4().to_string(), product)
            .await?;

        tracing::info!(product_code = %created.code, "Product created");
        Ok(created)
    }

    /// Replace a product's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Forbidden`, a validation error, or
    /// `ProductError::NotFound`.
    #[instrument(skip(self, principal, input), fields(user = %principal.identity))]
    pub async fn update(
        &self,
        principal: &Principal,
        code: &str,
        input: ProductInput,
    ) -> Result<Product, ProductError> {
        if !principal.is_admin() {
            return Err(ProductError::Forbidden);
        }
        let product = input.validate()?;

        let updated = self
            .store
            .update_product(code, product)
            .await?
            .ok_or(ProductError::NotFound)?;

        tracing::info!(product_code = %code, stock = updated.stock, "Product updated");
        Ok(updated)
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Forbidden` or `ProductError::NotFound`.
    #[instrument(skip(self, principal), fields(user = %principal.identity))]
    pub async fn delete(&self, principal: &Principal, code: &str) -> Result<(), ProductError> {
        if !principal.is_admin() {
            return Err(ProductError::Forbidden);
        }
        if !self.store.delete_product(code).await? {
            return Err(ProductError::NotFound);
        }

        tracing::info!(product_code = %code, "Product deleted");
        Ok(())
    }
}
