//! Order assembly: turn requested lines into priced items and a total.
//!
//! Lines are processed in request order. A product requested on more than one
//! line is reserved against the stock left by the earlier lines. The currency
//! check runs only once every line has been priced and reserved, so a stock
//! or quantity problem on any line is reported ahead of a currency mismatch.
//!
//! Nothing is persisted here.

use std::collections::HashMap;

use rust_decimal::Decimal;

use instashop_core::{Price, PriceError};

use crate::db::Store;
use crate::models::{OrderItem, OrderLine, Product, Reservation, User};

use super::OrderError;
use super::ledger;

/// Priced lines, their stock reservations, and the order total.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Priced items in request order.
    pub items: Vec<OrderItem>,
    /// One reservation per item, in the same order.
    pub reservations: Vec<Reservation>,
    /// Sum of all line totals, in the user's currency.
    pub total: Price,
}

/// Assemble `lines` for `user`.
///
/// # Errors
///
/// Returns `OrderError::ProductNotFound` for an unknown or deleted code,
/// any reservation error from the ledger, `OrderError::Price` on arithmetic
/// overflow, and `OrderError::CurrencyMismatch` if any product is priced in
/// a currency other than the user's. The first failing line wins.
pub async fn assemble<S: Store>(
    store: &S,
    user: &User,
    lines: &[OrderLine],
) -> Result<Assembly, OrderError> {
    // Latest stock projection per product code, so repeated codes draw from
    // what earlier lines left.
    let mut projected: HashMap<&str, Product> = HashMap::new();
    let mut items = Vec::with_capacity(lines.len());
    let mut reservations = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;

    for line in lines {
        let product = match projected.remove(line.product_code.as_str()) {
            Some(product) => product,
            None => store
                .product_by_code(&line.product_code)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound {
                    code: line.product_code.clone(),
                })?,
        };

        let reserved = ledger::reserve(&product, line.quantity)?;
        let quantity = reserved.reservation.quantity;
        let line_total = product.price.line_total(quantity)?;
        total = total
            .checked_add(line_total.amount())
            .ok_or(PriceError::Overflow)?;

        items.push(OrderItem {
            product_id: product.id,
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            unit_price: product.price.clone(),
            quantity,
            line_total,
        });
        reservations.push(reserved.reservation);
        projected.insert(line.product_code.as_str(), reserved.product);
    }

    if items
        .iter()
        .any(|item| item.unit_price.currency() != &user.currency)
    {
        return Err(OrderError::CurrencyMismatch {
            expected: user.currency.clone(),
        });
    }

    Ok(Assembly {
        items,
        reservations,
        total: Price::new(total, user.currency.clone())?,
    })
}
