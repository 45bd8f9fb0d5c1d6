//! Order domain types.
//!
//! An [`Order`] is a priced snapshot: its items and total are fixed at
//! placement and only the status changes afterwards.

use chrono::{DateTime, Utc};

use instashop_core::{OrderId, OrderStatus, Price, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Client-supplied reference, unique among live orders.
    pub reference: String,
    pub status: OrderStatus,
    /// Sum of all line totals, in the owner's currency.
    pub total: Price,
    /// Line items in the order they were requested.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One priced line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_code: String,
    pub product_name: String,
    /// Unit price at the time of ordering.
    pub unit_price: Price,
    pub quantity: u32,
    /// `quantity x unit_price`.
    pub line_total: Price,
}

/// A requested `(product code, quantity)` pair.
///
/// Quantity is signed because it arrives straight from the client; zero and
/// negative values are rejected during reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_code: String,
    pub quantity: i64,
}

impl OrderLine {
    /// Create a requested line.
    #[must_use]
    pub fn new(product_code: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
        }
    }
}

/// An in-memory claim on `quantity` units of a product.
///
/// Nothing is written when a reservation is issued. The store applies every
/// reservation of a placement, together with the order insert, in one atomic
/// unit, and rejects any reservation the product can no longer cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub product_code: String,
    pub quantity: u32,
}

/// A fully assembled order ready to be committed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub reference: String,
    pub total: Price,
    pub items: Vec<OrderItem>,
}
