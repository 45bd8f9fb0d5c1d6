//! Product domain types.

use chrono::{DateTime, Utc};

use instashop_core::{Price, ProductId, UserId};

/// A sellable product with its current stock level.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    /// Opaque public code, unique and immutable after creation.
    pub code: String,
    pub name: String,
    pub description: String,
    /// Unit price, carrying the product's currency.
    pub price: Price,
    /// Units on hand. Never negative.
    pub stock: u32,
    /// Administrator who created the product.
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a product's mutable fields.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
}
