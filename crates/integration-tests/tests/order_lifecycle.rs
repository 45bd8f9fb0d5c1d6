//! Cancellation, admin status changes and listing.

#![allow(clippy::unwrap_used)]

use instashop_api::db::MemoryStore;
use instashop_api::models::{Order, OrderLine, User};
use instashop_api::services::orders::{OrderError, OrderService};
use instashop_core::{OrderStatus, PageRequest, Role, TransitionError};
use instashop_integration_tests::{create_product, create_user, principal_for};

struct Fixture {
    store: MemoryStore,
    admin: User,
    user: User,
}

async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let admin = create_user(&store, "admin@example.com", "NGN", Role::Admin).await;
    let user = create_user(&store, "ada@example.com", "NGN", Role::User).await;
    create_product(&store, &admin, "A", "10.00", "NGN", 100).await;
    Fixture { store, admin, user }
}

async fn place(fx: &Fixture, reference: &str) -> Order {
    OrderService::new(&fx.store)
        .place(&principal_for(&fx.user), reference, &[OrderLine::new("A", 1)])
        .await
        .unwrap()
}

#[tokio::test]
async fn test_owner_cancels_pending_order() {
    let fx = fixture().await;
    place(&fx, "order-1").await;

    let order = OrderService::new(&fx.store)
        .cancel(&principal_for(&fx.user), "order-1")
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled() {
    let fx = fixture().await;
    place(&fx, "order-1").await;
    let service = OrderService::new(&fx.store);
    service
        .set_status(&principal_for(&fx.admin), "order-1", "Shipped")
        .await
        .unwrap();

    let result = service.cancel(&principal_for(&fx.user), "order-1").await;

    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition(TransitionError::NotCancellable {
            from: OrderStatus::Shipped
        }))
    ));
    let page = service
        .list(&principal_for(&fx.user), None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items[0].status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_terminal_orders_reject_admin_transitions() {
    let fx = fixture().await;
    place(&fx, "order-1").await;
    let service = OrderService::new(&fx.store);
    let admin = principal_for(&fx.admin);

    service.set_status(&admin, "order-1", "Delivered").await.unwrap();
    let result = service.set_status(&admin, "order-1", "Shipped").await;

    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition(TransitionError::Terminal {
            from: OrderStatus::Delivered
        }))
    ));
}

#[tokio::test]
async fn test_admin_may_revert_to_pending() {
    let fx = fixture().await;
    place(&fx, "order-1").await;
    let service = OrderService::new(&fx.store);
    let admin = principal_for(&fx.admin);

    service.set_status(&admin, "order-1", "Shipped").await.unwrap();
    let order = service.set_status(&admin, "order-1", "Pending").await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_other_users_cannot_cancel() {
    let fx = fixture().await;
    place(&fx, "order-1").await;
    let stranger = create_user(&fx.store, "eve@example.com", "NGN", Role::User).await;

    let result = OrderService::new(&fx.store)
        .cancel(&principal_for(&stranger), "order-1")
        .await;

    assert!(matches!(result, Err(OrderError::Forbidden)));
}

#[tokio::test]
async fn test_listing_is_newest_first_and_filtered() {
    let fx = fixture().await;
    for i in 1..=3 {
        place(&fx, &format!("order-{i}")).await;
    }
    let service = OrderService::new(&fx.store);
    let user = principal_for(&fx.user);
    service.cancel(&user, "order-2").await.unwrap();

    let all = service
        .list(&user, None, PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.total_pages(), 2);
    assert_eq!(all.items.len(), 2);
    assert_eq!(all.items[0].reference, "order-3");

    let cancelled = service
        .list(&user, Some("Cancelled"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(cancelled.total, 1);
    assert_eq!(cancelled.items[0].reference, "order-2");

    let beyond = service
        .list(&user, None, PageRequest::new(Some(9), Some(2)))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 3);
}
