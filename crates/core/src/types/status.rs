//! Order status and its lifecycle rules.
//!
//! ```text
//! Pending ──> Shipped ──> Delivered
//!    │
//!    └──────> Cancelled
//! ```
//!
//! `Delivered` and `Cancelled` are terminal. Owners may only cancel a
//! `Pending` order; administrators may move a `Pending` or `Shipped` order to
//! any known status.

use serde::{Deserialize, Serialize};

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "instashop.order_status", rename_all = "PascalCase")
)]
pub enum OrderStatus {
    /// Placed, stock reserved, not yet shipped.
    #[default]
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Withdrawn before shipping.
    Cancelled,
}

/// A status string that does not name any [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid order status")]
pub struct UnknownStatus(pub String);

/// A transition the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Only pending orders can be cancelled by their owner.
    #[error("Order in {from} status cannot be cancelled")]
    NotCancellable {
        /// Status the order was in.
        from: OrderStatus,
    },
    /// The order is in a terminal status.
    #[error("Order has been {from}")]
    Terminal {
        /// Status the order was in.
        from: OrderStatus,
    },
}

impl TransitionError {
    /// The status the order was in when the transition was refused.
    #[must_use]
    pub const fn from_status(&self) -> OrderStatus {
        match self {
            Self::NotCancellable { from } | Self::Terminal { from } => *from,
        }
    }
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Shipped, Self::Delivered, Self::Cancelled];

    /// Canonical name, as stored and serialized.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Owner-initiated cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotCancellable`] naming the current status
    /// unless the order is `Pending`.
    pub const fn cancel(self) -> Result<Self, TransitionError> {
        match self {
            Self::Pending => Ok(Self::Cancelled),
            from => Err(TransitionError::NotCancellable { from }),
        }
    }

    /// Administrator-initiated transition to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Terminal`] if the order is already
    /// `Delivered` or `Cancelled`.
    pub const fn transition_to(self, target: Self) -> Result<Self, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal { from: self });
        }
        Ok(target)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_statuses() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert!("pending".parse::<OrderStatus>().is_err());
        assert!("Refunded".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_cancel_only_from_pending() {
        assert_eq!(OrderStatus::Pending.cancel(), Ok(OrderStatus::Cancelled));

        for from in [
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let err = from.cancel().unwrap_err();
            assert_eq!(err.from_status(), from);
            assert_eq!(
                err.to_string(),
                format!("Order in {from} status cannot be cancelled")
            );
        }
    }

    #[test]
    fn test_admin_transition_from_open_statuses() {
        for from in [OrderStatus::Pending, OrderStatus::Shipped] {
            for target in OrderStatus::ALL {
                assert_eq!(from.transition_to(target), Ok(target));
            }
        }
    }

    #[test]
    fn test_admin_transition_from_terminal_statuses() {
        for from in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            for target in OrderStatus::ALL {
                assert_eq!(
                    from.transition_to(target),
                    Err(TransitionError::Terminal { from })
                );
            }
        }
        assert_eq!(
            OrderStatus::Delivered
                .transition_to(OrderStatus::Pending)
                .unwrap_err()
                .to_string(),
            "Order has been Delivered"
        );
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, "\"Shipped\"");
    }
}
