//! Order service: placement, cancellation, admin transitions and listing.
//!
//! Placement runs, short-circuiting on the first failure:
//!
//! 1. reject a reference that is already in use
//! 2. resolve the principal to a user
//! 3. assemble priced lines and stock reservations (no writes)
//! 4. commit the order and every stock decrement in one atomic unit
//!
//! Step 4 also enforces reference uniqueness and non-negative stock at the
//! storage layer, so two racing placements cannot both pass steps 1 and 3
//! and then both commit. Nothing is retried.

mod assembler;
mod error;
pub mod ledger;

pub use assembler::{Assembly, assemble};
pub use error::{ErrorKind, OrderError};

use tracing::instrument;
use uuid::Uuid;

use instashop_core::{OrderStatus, Page, PageRequest, Principal, TransitionError};

use crate::db::{RepositoryError, Store};
use crate::models::{NewOrder, Order, OrderLine, User};

/// Order service.
pub struct OrderService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> OrderService<'a, S> {
    /// Create a new order service over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Place an order for the principal.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DuplicateOrder` if the reference is taken,
    /// `OrderError::UserNotFound` if the principal has no live account, any
    /// assembly error verbatim, and `OrderError::Persistence` for storage
    /// failures.
    #[instrument(skip(self, principal, lines), fields(user = %principal.identity, lines = lines.len()))]
    pub async fn place(
        &self,
        principal: &Principal,
        reference: &str,
        lines: &[OrderLine],
    ) -> Result<Order, OrderError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(OrderError::MissingReference);
        }
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        if self.store.order_by_reference(reference).await?.is_some() {
            return Err(OrderError::DuplicateOrder);
        }

        let user = self.resolve_user(principal).await?;
        let assembly = assemble(self.store, &user, lines).await?;

        let new_order = NewOrder {
            user_id: user.id,
            reference: reference.to_owned(),
            total: assembly.total,
            items: assembly.items,
        };

        let order = self
            .store
            .commit_placement(new_order.clone(), &assembly.reservations)
            .await
            .map_err(|e| commit_error(e, &new_order))?;

        tracing::info!(
            order_reference = %order.reference,
            user_id = %user.id,
            total = %order.total,
            "Order placed"
        );

        Ok(order)
    }

    /// Cancel one of the principal's own orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UserNotFound`, `OrderError::OrderNotFound`,
    /// `OrderError::Forbidden` if the order belongs to someone else, and
    /// `OrderError::InvalidTransition` unless the order is `Pending`.
    #[instrument(skip(self, principal), fields(user = %principal.identity))]
    pub async fn cancel(&self, principal: &Principal, reference: &str) -> Result<Order, OrderError> {
        let user = self.resolve_user(principal).await?;
        let order = self.find(reference).await?;

        if order.user_id != user.id {
            tracing::warn!(
                order_reference = %reference,
                user_id = %user.id,
                "Cancel attempted on another user's order"
            );
            return Err(OrderError::Forbidden);
        }

        let next = order.status.cancel()?;
        let updated = self.apply(&order, next, OrderStatus::cancel).await?;

        tracing::info!(order_reference = %reference, "Order cancelled");
        Ok(updated)
    }

    /// Move any order to `target`. Administrators only.
    ///
    /// The target is parsed first, so an unknown status is reported whatever
    /// state the order is in.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UnknownStatus`, `OrderError::Forbidden` for a
    /// non-admin principal, `OrderError::OrderNotFound`, and
    /// `OrderError::InvalidTransition` if the order is `Delivered` or
    /// `Cancelled`.
    #[instrument(skip(self, principal), fields(user = %principal.identity))]
    pub async fn set_status(
        &self,
        principal: &Principal,
        reference: &str,
        target: &str,
    ) -> Result<Order, OrderError> {
        let target: OrderStatus = target.trim().parse()?;

        if !principal.is_admin() {
            return Err(OrderError::Forbidden);
        }

        let order = self.find(reference).await?;
        let next = order.status.transition_to(target)?;
        let updated = self
            .apply(&order, next, |from| from.transition_to(target))
            .await?;

        tracing::info!(
            order_reference = %reference,
            from = %order.status,
            to = %next,
            "Order status updated"
        );
        Ok(updated)
    }

    /// One page of the principal's orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UnknownStatus` for an unrecognised filter and
    /// `OrderError::UserNotFound` if the principal has no live account.
    pub async fn list(
        &self,
        principal: &Principal,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Order>, OrderError> {
        let status = status
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<OrderStatus>)
            .transpose()?;

        let user = self.resolve_user(principal).await?;
        Ok(self.store.list_user_orders(user.id, status, page).await?)
    }

    /// Resolve the principal's identity to a live user.
    async fn resolve_user(&self, principal: &Principal) -> Result<User, OrderError> {
        let Ok(public_id) = Uuid::parse_str(&principal.identity) else {
            return Err(OrderError::UserNotFound);
        };

        self.store
            .user_by_public_id(public_id)
            .await?
            .ok_or(OrderError::UserNotFound)
    }

    async fn find(&self, reference: &str) -> Result<Order, OrderError> {
        self.store
            .order_by_reference(reference)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// Write `next` conditionally on the status `order` was read in.
    ///
    /// If another writer got there first, the order is re-read and `rule` is
    /// re-applied to its current status so the caller sees the lifecycle
    /// error for the state the order is actually in.
    async fn apply(
        &self,
        order: &Order,
        next: OrderStatus,
        rule: impl Fn(OrderStatus) -> Result<OrderStatus, TransitionError> + Send,
    ) -> Result<Order, OrderError> {
        if let Some(updated) = self
            .store
            .update_order_status(order.id, order.status, next)
            .await?
        {
            return Ok(updated);
        }

        let current = self.find(&order.reference).await?;
        rule(current.status)?;
        Err(OrderError::ConcurrentUpdate)
    }
}

/// Translate a failed commit into the order error for the step that lost.
fn commit_error(error: RepositoryError, order: &NewOrder) -> OrderError {
    match error {
        RepositoryError::Conflict(_) => OrderError::DuplicateOrder,
        RepositoryError::InsufficientStock { code, available } => {
            let name = order
                .items
                .iter()
                .find(|item| item.product_code == code)
                .map(|item| item.product_name.clone())
                .unwrap_or_else(|| code.clone());
            if available == 0 {
                OrderError::OutOfStock { code, name }
            } else {
                OrderError::InsufficientStock {
                    code,
                    name,
                    available,
                }
            }
        }
        RepositoryError::ProductGone { code } => OrderError::ProductNotFound { code },
        other => OrderError::Persistence(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use instashop_core::{CurrencyCode, Email, Price, Role};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewProduct, NewUser};

    async fn user(store: &MemoryStore, email: &str, role: Role) -> Principal {
        let user = store
            .create_user(NewUser {
                email: Email::parse(email).unwrap(),
                password_hash: String::new(),
                first_name: "Test".to_owned(),
                last_name: "User".to_owned(),
                currency: CurrencyCode::parse("NGN").unwrap(),
                role,
            })
            .await
            .unwrap();
        Principal::new(user.public_id.to_string(), role)
    }

    async fn product(store: &MemoryStore, code: &str, stock: u32) {
        store
            .create_product(
                instashop_core::UserId::new(1),
                code.to_owned(),
                NewProduct {
                    name: code.to_owned(),
                    description: String::new(),
                    price: Price::new(
                        Decimal::from_str("10.00").unwrap(),
                        CurrencyCode::parse("NGN").unwrap(),
                    )
                    .unwrap(),
                    stock,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_place_rejects_empty_input() {
        let store = MemoryStore::new();
        let principal = user(&store, "a@example.com", Role::User).await;
        let service = OrderService::new(&store);

        assert!(matches!(
            service.place(&principal, "  ", &[OrderLine::new("A", 1)]).await,
            Err(OrderError::MissingReference)
        ));
        assert!(matches!(
            service.place(&principal, "ref", &[]).await,
            Err(OrderError::EmptyOrder)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_checked_before_user() {
        let store = MemoryStore::new();
        let principal = user(&store, "a@example.com", Role::User).await;
        product(&store, "A", 5).await;
        let service = OrderService::new(&store);
        service
            .place(&principal, "ref-1", &[OrderLine::new("A", 1)])
            .await
            .unwrap();

        let stranger = Principal::new(Uuid::new_v4().to_string(), Role::User);
        let err = service
            .place(&stranger, "ref-1", &[OrderLine::new("A", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::DuplicateOrder));

        let err = service
            .place(&stranger, "ref-2", &[OrderLine::new("A", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::UserNotFound));
    }

    #[tokio::test]
    async fn test_malformed_identity_is_user_not_found() {
        let store = MemoryStore::new();
        let service = OrderService::new(&store);
        let principal = Principal::new("not-a-uuid", Role::User);

        let err = service
            .place(&principal, "ref", &[OrderLine::new("A", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::UserNotFound));
    }

    #[tokio::test]
    async fn test_cancel_requires_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com", Role::User).await;
        let other = user(&store, "other@example.com", Role::User).await;
        product(&store, "A", 5).await;
        let service = OrderService::new(&store);
        service
            .place(&owner, "ref-1", &[OrderLine::new("A", 1)])
            .await
            .unwrap();

        let err = service.cancel(&other, "ref-1").await.unwrap_err();
        assert!(matches!(err, OrderError::Forbidden));

        let cancelled = service.cancel(&owner, "ref-1").await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_set_status_requires_admin_and_known_status() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner@example.com", Role::User).await;
        let admin = user(&store, "admin@example.com", Role::Admin).await;
        product(&store, "A", 5).await;
        let service = OrderService::new(&store);
        service
            .place(&owner, "ref-1", &[OrderLine::new("A", 1)])
            .await
            .unwrap();

        // Unknown status wins over both authorization and lookup.
        assert!(matches!(
            service.set_status(&owner, "missing", "Lost").await,
            Err(OrderError::UnknownStatus(_))
        ));
        assert!(matches!(
            service.set_status(&owner, "ref-1", "Shipped").await,
            Err(OrderError::Forbidden)
        ));
        assert!(matches!(
            service.set_status(&admin, "missing", "Shipped").await,
            Err(OrderError::OrderNotFound)
        ));

        let shipped = service.set_status(&admin, "ref-1", "Shipped").await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_filter() {
        let store = MemoryStore::new();
        let principal = user(&store, "a@example.com", Role::User).await;
        let service = OrderService::new(&store);

        assert!(matches!(
            service
                .list(&principal, Some("Lost"), PageRequest::default())
                .await,
            Err(OrderError::UnknownStatus(_))
        ));

        let page = service
            .list(&principal, Some(""), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_commit_error_translation() {
        let order = NewOrder {
            user_id: instashop_core::UserId::new(1),
            reference: "ref".to_owned(),
            total: Price::new(Decimal::ZERO, CurrencyCode::parse("NGN").unwrap()).unwrap(),
            items: vec![],
        };

        assert!(matches!(
            commit_error(RepositoryError::Conflict("dup".to_owned()), &order),
            OrderError::DuplicateOrder
        ));
        assert!(matches!(
            commit_error(
                RepositoryError::InsufficientStock {
                    code: "A".to_owned(),
                    available: 0
                },
                &order
            ),
            OrderError::OutOfStock { .. }
        ));
        assert!(matches!(
            commit_error(
                RepositoryError::InsufficientStock {
                    code: "A".to_owned(),
                    available: 1
                },
                &order
            ),
            OrderError::InsufficientStock { available: 1, .. }
        ));
        let err = commit_error(
            RepositoryError::ProductGone {
                code: "A".to_owned(),
            },
            &order,
        );
        assert!(matches!(err, OrderError::ProductNotFound { ref code } if code == "A"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
