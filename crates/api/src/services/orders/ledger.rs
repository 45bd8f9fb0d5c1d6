//! Inventory ledger.
//!
//! A pure read-check-decrement decision over a product snapshot. It performs
//! no I/O, so the same check serves both for validating a request and for
//! projecting the stock a placement will leave behind. The decrement itself
//! is applied by the store inside the placement transaction.

use crate::models::{Product, Reservation};

use super::OrderError;

/// Outcome of a successful reservation.
#[derive(Debug, Clone)]
pub struct Reserved {
    /// The product with stock reduced by the reserved quantity.
    pub product: Product,
    /// Token the store applies atomically with the order insert.
    pub reservation: Reservation,
}

/// Reserve `quantity` units of `product`.
///
/// Checks run in this order: quantity must be positive, the product must
/// have any stock, and the stock must cover the quantity.
///
/// # Errors
///
/// Returns `OrderError::InvalidQuantity` if `quantity` is zero or negative.
/// Returns `OrderError::OutOfStock` if the product's stock is zero.
/// Returns `OrderError::InsufficientStock` (with the available count) if
/// the stock is below `quantity`.
pub fn reserve(product: &Product, quantity: i64) -> Result<Reserved, OrderError> {
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| OrderError::InvalidQuantity {
            code: product.code.clone(),
            name: product.name.clone(),
        })?;

    if product.stock == 0 {
        return Err(OrderError::OutOfStock {
            code: product.code.clone(),
            name: product.name.clone(),
        });
    }

    let remaining =
        product
            .stock
            .checked_sub(quantity)
            .ok_or_else(|| OrderError::InsufficientStock {
                code: product.code.clone(),
                name: product.name.clone(),
                available: product.stock,
            })?;

    let mut updated = product.clone();
    updated.stock = remaining;

    Ok(Reserved {
        reservation: Reservation {
            product_id: product.id,
            product_code: product.code.clone(),
            quantity,
        },
        product: updated,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use instashop_core::{CurrencyCode, Price, ProductId, UserId};

    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new(1),
            code: "kettle-01".to_owned(),
            name: "Kettle".to_owned(),
            description: String::new(),
            price: Price::new(
                Decimal::from_str("10.00").unwrap(),
                CurrencyCode::parse("NGN").unwrap(),
            )
            .unwrap(),
            stock,
            owner: UserId::new(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reserve_decrements_projection_only() {
        let original = product(5);
        let reserved = reserve(&original, 2).unwrap();

        assert_eq!(reserved.product.stock, 3);
        assert_eq!(reserved.reservation.quantity, 2);
        assert_eq!(original.stock, 5);
    }

    #[test]
    fn test_reserve_exact_stock() {
        assert_eq!(reserve(&product(1), 1).unwrap().product.stock, 0);
    }

    #[test]
    fn test_reserve_rejects_non_positive_quantity() {
        for quantity in [0, -1, i64::MIN, i64::MAX] {
            assert!(
                matches!(
                    reserve(&product(5), quantity),
                    Err(OrderError::InvalidQuantity { .. })
                ),
                "{quantity}"
            );
        }
    }

    #[test]
    fn test_reserve_out_of_stock() {
        let err = reserve(&product(0), 1).unwrap_err();
        assert!(matches!(err, OrderError::OutOfStock { .. }));
        assert_eq!(err.to_string(), "Product Kettle is out of stock");
    }

    #[test]
    fn test_reserve_insufficient_stock_reports_available() {
        let err = reserve(&product(2), 3).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InsufficientStock { available: 2, .. }
        ));
    }

    #[test]
    fn test_invalid_quantity_checked_before_stock() {
        assert!(matches!(
            reserve(&product(0), 0),
            Err(OrderError::InvalidQuantity { .. })
        ));
    }
}
