//! Order placement against the in-memory store.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use rust_decimal::Decimal;

use uuid::Uuid;

use instashop_api::db::{MemoryStore, RepositoryError, Store};
use instashop_api::models::{
    NewOrder, NewProduct, NewUser, Order, OrderLine, Product, Reservation, User,
};
use instashop_api::services::orders::{ErrorKind, OrderError, OrderService};
use instashop_core::{Email, OrderId, OrderStatus, Page, PageRequest, Role, UserId};
use instashop_integration_tests::{create_product, create_user, principal_for, stock_of};

#[tokio::test]
async fn test_place_two_products_decrements_both() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 5).await;
    create_product(&store, &admin, "B", "5.00", "NGN", 1).await;

    let order = OrderService::new(&store)
        .place(
            &principal_for(&user),
            "order123",
            &[OrderLine::new("A", 2), OrderLine::new("B", 1)],
        )
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total.amount(), Decimal::from_str("25.00").unwrap());
    assert_eq!(order.total.currency().as_str(), "NGN");
    assert_eq!(order.items.len(), 2);
    assert_eq!(stock_of(&store, "A").await, 3);
    assert_eq!(stock_of(&store, "B").await, 0);
}

#[tokio::test]
async fn test_repeated_reference_conflicts_without_touching_stock() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 5).await;
    let service = OrderService::new(&store);
    let lines = [OrderLine::new("A", 2)];

    service
        .place(&principal_for(&user), "order123", &lines)
        .await
        .unwrap();
    let second = service.place(&principal_for(&user), "order123", &lines).await;

    assert!(matches!(second, Err(OrderError::DuplicateOrder)));
    assert_eq!(stock_of(&store, "A").await, 3);
}

#[tokio::test]
async fn test_currency_mismatch_writes_nothing() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "USD-1", "3.00", "USD", 4).await;

    let result = OrderService::new(&store)
        .place(&principal_for(&user), "order-usd", &[OrderLine::new("USD-1", 1)])
        .await;

    assert!(matches!(result, Err(OrderError::CurrencyMismatch { .. })));
    assert_eq!(stock_of(&store, "USD-1").await, 4);
    assert!(store.order_by_reference("order-usd").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failure_on_later_line_leaves_earlier_lines_untouched() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 5).await;
    create_product(&store, &admin, "B", "5.00", "NGN", 1).await;

    let result = OrderService::new(&store)
        .place(
            &principal_for(&user),
            "order-partial",
            &[OrderLine::new("A", 2), OrderLine::new("B", 3)],
        )
        .await;

    match result {
        Err(OrderError::InsufficientStock { code, available, .. }) => {
            assert_eq!(code, "B");
            assert_eq!(available, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(stock_of(&store, "A").await, 5);
    assert_eq!(stock_of(&store, "B").await, 1);
}

#[tokio::test]
async fn test_unknown_and_deleted_products_are_not_found() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "GONE", "1.00", "NGN", 9).await;
    store.delete_product("GONE").await.unwrap();
    let service = OrderService::new(&store);

    for code in ["GONE", "NEVER"] {
        let result = service
            .place(&principal_for(&user), "order-x", &[OrderLine::new(code, 1)])
            .await;
        assert!(
            matches!(&result, Err(OrderError::ProductNotFound { code: c }) if c == code),
            "{code}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_out_of_stock_product() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "EMPTY", "1.00", "NGN", 0).await;

    let result = OrderService::new(&store)
        .place(&principal_for(&user), "order-empty", &[OrderLine::new("EMPTY", 1)])
        .await;

    assert!(matches!(result, Err(OrderError::OutOfStock { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_never_oversell() {
    const STOCK: u32 = 10;
    const QUANTITY: i64 = 3;
    const ATTEMPTS: usize = 12;

    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "HOT", "2.50", "NGN", STOCK).await;
    let principal = principal_for(&user);

    let handles: Vec<_> = (0..ATTEMPTS)
        .map(|i| {
            let store = store.clone();
            let principal = principal.clone();
            tokio::spawn(async move {
                OrderService::new(&store)
                    .place(&principal, &format!("race-{i}"), &[OrderLine::new("HOT", QUANTITY)])
                    .await
            })
        })
        .collect();

    let mut successes = 0_u32;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::InsufficientStock { .. } | OrderError::OutOfStock { .. }) => {}
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }

    let per_order = u32::try_from(QUANTITY).unwrap();
    assert_eq!(successes, STOCK / per_order);
    assert_eq!(stock_of(&store, "HOT").await, STOCK - successes * per_order);
}

#[tokio::test]
async fn test_reference_stays_taken_after_cancel() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 5).await;
    let service = OrderService::new(&store);
    let principal = principal_for(&user);

    service
        .place(&principal, "order123", &[OrderLine::new("A", 2)])
        .await
        .unwrap();
    service.cancel(&principal, "order123").await.unwrap();
    let stock = stock_of(&store, "A").await;

    let result = service
        .place(&principal, "order123", &[OrderLine::new("A", 1)])
        .await;

    assert!(matches!(result, Err(OrderError::DuplicateOrder)));
    assert_eq!(stock_of(&store, "A").await, stock);
    let order = store.order_by_reference("order123").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

/// Store that soft-deletes every product right after handing it out, so the
/// product disappears between assembly and commit.
struct DeletingStore(MemoryStore);

impl Store for DeletingStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.0.create_user(user).await
    }

    async fn user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.0.user_credentials(email).await
    }

    async fn user_by_public_id(&self, public_id: Uuid) -> Result<Option<User>, RepositoryError> {
        self.0.user_by_public_id(public_id).await
    }

    async fn create_product(
        &self,
        owner: UserId,
        code: String,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        self.0.create_product(owner, code, product).await
    }

    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let product = self.0.product_by_code(code).await?;
        if product.is_some() {
            self.0.delete_product(code).await?;
        }
        Ok(product)
    }

    async fn update_product(
        &self,
        code: &str,
        product: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        self.0.update_product(code, product).await
    }

    async fn delete_product(&self, code: &str) -> Result<bool, RepositoryError> {
        self.0.delete_product(code).await
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        self.0.order_by_reference(reference).await
    }

    async fn list_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        self.0.list_user_orders(user_id, status, page).await
    }

    async fn commit_placement(
        &self,
        order: NewOrder,
        reservations: &[Reservation],
    ) -> Result<Order, RepositoryError> {
        self.0.commit_placement(order, reservations).await
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        self.0.update_order_status(id, expected, next).await
    }
}

#[tokio::test]
async fn test_product_deleted_before_commit_is_not_found() {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 5).await;
    let racing = DeletingStore(store.clone());

    let err = OrderService::new(&racing)
        .place(&principal_for(&user), "ref", &[OrderLine::new("A", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::ProductNotFound { ref code } if code == "A"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(store.order_by_reference("ref").await.unwrap().is_none());
}
