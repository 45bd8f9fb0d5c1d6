//! Order subsystem error types.

use thiserror::Error;

use instashop_core::{CurrencyCode, PriceError, TransitionError, UnknownStatus};

use crate::db::RepositoryError;

/// Errors that can occur while placing or transitioning orders.
///
/// Display strings are user-facing, except for [`OrderError::Persistence`]
/// which is only ever logged.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order reference supplied.
    #[error("Order reference is required")]
    MissingReference,

    /// No product lines supplied.
    #[error("Order must contain at least one product")]
    EmptyOrder,

    /// A requested product does not exist or was deleted.
    #[error("Product with code {code} is not found")]
    ProductNotFound {
        /// Requested product code.
        code: String,
    },

    /// The principal does not resolve to a live user.
    #[error("User not found")]
    UserNotFound,

    /// No live order has the given reference.
    #[error("Order not found")]
    OrderNotFound,

    /// Requested quantity is zero or negative.
    #[error("Invalid quantity for product {name} (code: {code})")]
    InvalidQuantity {
        /// Product code.
        code: String,
        /// Product display name.
        name: String,
    },

    /// The product has no stock at all.
    #[error("Product {name} is out of stock")]
    OutOfStock {
        /// Product code.
        code: String,
        /// Product display name.
        name: String,
    },

    /// The product has some stock, but less than requested.
    #[error("Product: {name} is not enough in stock. There are only {available} left")]
    InsufficientStock {
        /// Product code.
        code: String,
        /// Product display name.
        name: String,
        /// Units still available.
        available: u32,
    },

    /// At least one product is priced in a currency other than the user's.
    #[error("Product currency mismatch with user's currency: {expected}")]
    CurrencyMismatch {
        /// The user's currency.
        expected: CurrencyCode,
    },

    /// Line or order total does not fit in a decimal.
    #[error("{0}")]
    Price(#[from] PriceError),

    /// The lifecycle does not allow the transition.
    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),

    /// Target status is not a known status.
    #[error("{0}")]
    UnknownStatus(#[from] UnknownStatus),

    /// An order with this reference already exists.
    #[error("Order already exists")]
    DuplicateOrder,

    /// The order changed status between read and write.
    #[error("Order was modified concurrently, please retry")]
    ConcurrentUpdate,

    /// The principal may not act on this order.
    #[error("You do not have the right to access this resource")]
    Forbidden,

    /// Storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Broad category of an [`OrderError`], used by the transport layer to pick
/// a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity missing (404).
    NotFound,
    /// Request rejected by a business rule (400).
    Validation,
    /// Duplicate reference or lost race (409).
    Conflict,
    /// Principal lacks the right (403).
    Authorization,
    /// Storage failure (500).
    Persistence,
}

impl OrderError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProductNotFound { .. } | Self::UserNotFound | Self::OrderNotFound => {
                ErrorKind::NotFound
            }
            Self::MissingReference
            | Self::EmptyOrder
            | Self::InvalidQuantity { .. }
            | Self::OutOfStock { .. }
            | Self::InsufficientStock { .. }
            | Self::CurrencyMismatch { .. }
            | Self::Price(_)
            | Self::InvalidTransition(_)
            | Self::UnknownStatus(_) => ErrorKind::Validation,
            Self::DuplicateOrder | Self::ConcurrentUpdate => ErrorKind::Conflict,
            Self::Forbidden => ErrorKind::Authorization,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

#[cfg(test)]
mod tests {
    use instashop_core::OrderStatus;

    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = OrderError::InsufficientStock {
            code: "abc".to_owned(),
            name: "Kettle".to_owned(),
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Product: Kettle is not enough in stock. There are only 2 left"
        );

        let err = OrderError::InvalidTransition(TransitionError::NotCancellable {
            from: OrderStatus::Shipped,
        });
        assert_eq!(err.to_string(), "Order in Shipped status cannot be cancelled");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(OrderError::DuplicateOrder.kind(), ErrorKind::Conflict);
        assert_eq!(OrderError::Forbidden.kind(), ErrorKind::Authorization);
        assert_eq!(OrderError::OrderNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            OrderError::UnknownStatus(UnknownStatus("Lost".to_owned())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            OrderError::Persistence(RepositoryError::NotFound).kind(),
            ErrorKind::Persistence
        );
    }
}
