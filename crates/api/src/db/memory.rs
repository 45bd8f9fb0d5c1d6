//! In-memory [`Store`] for tests and local experiments.
//!
//! All tables live behind one `tokio::sync::RwLock`. Every write takes the
//! write lock for its whole duration, which gives placements the same
//! all-or-nothing and no-oversell guarantees as the `PostgreSQL` transaction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use instashop_core::{Email, OrderId, OrderStatus, Page, PageRequest, ProductId, UserId};

use super::{RepositoryError, Store};
use crate::models::{NewOrder, NewProduct, NewUser, Order, Product, Reservation, User};

#[derive(Debug)]
struct Row<T> {
    record: T,
    is_deleted: bool,
}

impl<T> Row<T> {
    const fn live(record: T) -> Self {
        Self {
            record,
            is_deleted: false,
        }
    }

    /// The record, unless soft-deleted.
    const fn get(&self) -> Option<&T> {
        if self.is_deleted {
            None
        } else {
            Some(&self.record)
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<Row<(User, String)>>,
    products: Vec<Row<Product>>,
    orders: Vec<Row<Order>>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn live_users(&self) -> impl Iterator<Item = &(User, String)> {
        self.users.iter().filter_map(Row::get)
    }

    fn live_product_mut(&mut self, code: &str) -> Option<&mut Product> {
        self.products
            .iter_mut()
            .filter(|row| !row.is_deleted)
            .map(|row| &mut row.record)
            .find(|p| p.code == code)
    }

    fn live_order(&self, reference: &str) -> Option<&Order> {
        self.orders
            .iter()
            .filter_map(Row::get)
            .find(|o| o.reference == reference)
    }
}

/// [`Store`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.live_users().any(|(u, _)| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::new(tables.next_id()),
            public_id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            currency: user.currency,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables
            .users
            .push(Row::live((created.clone(), user.password_hash)));
        Ok(created)
    }

    async fn user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.live_users().find(|(u, _)| &u.email == email).cloned())
    }

    async fn user_by_public_id(&self, public_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .live_users()
            .find(|(u, _)| u.public_id == public_id)
            .map(|(u, _)| u.clone()))
    }

    async fn create_product(
        &self,
        owner: UserId,
        code: String,
        product: NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.products.iter().any(|row| row.record.code == code) {
            return Err(RepositoryError::Conflict(
                "product code already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let created = Product {
            id: ProductId::new(tables.next_id()),
            code,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            owner,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(Row::live(created.clone()));
        Ok(created)
    }

    async fn product_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .iter()
            .filter_map(Row::get)
            .find(|p| p.code == code)
            .cloned())
    }

    async fn update_product(
        &self,
        code: &str,
        product: NewProduct,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.live_product_mut(code).map(|existing| {
            existing.name = product.name;
            existing.description = product.description;
            existing.price = product.price;
            existing.stock = product.stock;
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn delete_product(&self, code: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables
            .products
            .iter_mut()
            .find(|row| !row.is_deleted && row.record.code == code)
        {
            Some(row) => {
                row.is_deleted = true;
                row.record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.live_order(reference).cloned())
    }

    async fn list_user_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Order> = tables
            .orders
            .iter()
            .filter_map(Row::get)
            .filter(|o| o.user_id == user_id && status.is_none_or(|s| o.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.size() as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn commit_placement(
        &self,
        order: NewOrder,
        reservations: &[Reservation],
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.live_order(&order.reference).is_some() {
            return Err(RepositoryError::Conflict(
                "order reference already exists".to_owned(),
            ));
        }

        // Check every reservation against current stock before touching any row.
        let mut remaining: HashMap<ProductId, u32> = HashMap::new();
        for reservation in reservations {
            let stock = match remaining.get(&reservation.product_id) {
                Some(stock) => *stock,
                None => tables
                    .products
                    .iter()
                    .filter_map(Row::get)
                    .find(|p| p.id == reservation.product_id)
                    .map(|p| p.stock)
                    .ok_or_else(|| RepositoryError::ProductGone {
                        code: reservation.product_code.clone(),
                    })?,
            };
            let left = stock.checked_sub(reservation.quantity).ok_or_else(|| {
                RepositoryError::InsufficientStock {
                    code: reservation.product_code.clone(),
                    available: stock,
                }
            })?;
            remaining.insert(reservation.product_id, left);
        }

        let now = Utc::now();
        for row in &mut tables.products {
            if let Some(left) = remaining.get(&row.record.id) {
                row.record.stock = *left;
                row.record.updated_at = now;
            }
        }

        let placed = Order {
            id: OrderId::new(tables.next_id()),
            user_id: order.user_id,
            reference: order.reference,
            status: OrderStatus::Pending,
            total: order.total,
            items: order.items,
            created_at: now,
            updated_at: now,
        };
        tables.orders.push(Row::live(placed.clone()));
        Ok(placed)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .filter(|row| !row.is_deleted)
            .map(|row| &mut row.record)
            .find(|o| o.id == id && o.status == expected);

        Ok(order.map(|order| {
            order.status = next;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use instashop_core::{CurrencyCode, Price, Role};

    use super::*;
    use crate::models::OrderItem;

    fn ngn_price(amount: &str) -> Price {
        Price::new(
            Decimal::from_str(amount).unwrap(),
            CurrencyCode::parse("NGN").unwrap(),
        )
        .unwrap()
    }

    async fn seed_product(store: &MemoryStore, code: &str, stock: u32) -> Product {
        store
            .create_product(
                UserId::new(1),
                code.to_owned(),
                NewProduct {
                    name: format!("Product {code}"),
                    description: String::new(),
                    price: ngn_price("10.00"),
                    stock,
                },
            )
            .await
            .unwrap()
    }

    fn new_order(reference: &str, product: &Product, quantity: u32) -> (NewOrder, Reservation) {
        let line_total = product.price.line_total(quantity).unwrap();
        let order = NewOrder {
            user_id: UserId::new(1),
            reference: reference.to_owned(),
            total: line_total.clone(),
            items: vec![OrderItem {
                product_id: product.id,
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                unit_price: product.price.clone(),
                quantity,
                line_total,
            }],
        };
        let reservation = Reservation {
            product_id: product.id,
            product_code: product.code.clone(),
            quantity,
        };
        (order, reservation)
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: Email::parse("ada@example.com").unwrap(),
            password_hash: "hash".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            currency: CurrencyCode::parse("NGN").unwrap(),
            role: Role::User,
        };

        store.create_user(user.clone()).await.unwrap();
        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_invisible() {
        let store = MemoryStore::new();
        seed_product(&store, "A", 3).await;

        assert!(store.delete_product("A").await.unwrap());
        assert!(store.product_by_code("A").await.unwrap().is_none());
        assert!(!store.delete_product("A").await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_placement_rejects_without_writing() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "A", 2).await;
        let (order, mut reservation) = new_order("ref-1", &product, 2);
        reservation.quantity = 3;

        let err = store
            .commit_placement(order, &[reservation])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::InsufficientStock { available: 2, .. }
        ));
        assert_eq!(store.product_by_code("A").await.unwrap().unwrap().stock, 2);
        assert!(store.order_by_reference("ref-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_placement_names_deleted_product() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "A", 5).await;
        let (order, reservation) = new_order("ref-1", &product, 1);
        store.delete_product("A").await.unwrap();

        let err = store
            .commit_placement(order, &[reservation])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ProductGone { ref code } if code == "A"));
        assert!(store.order_by_reference("ref-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_placement_duplicate_reference() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "A", 5).await;

        let (order, reservation) = new_order("ref-1", &product, 1);
        store
            .commit_placement(order.clone(), &[reservation.clone()])
            .await
            .unwrap();

        let err = store
            .commit_placement(order, &[reservation])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.product_by_code("A").await.unwrap().unwrap().stock, 4);
    }

    #[tokio::test]
    async fn test_update_order_status_is_conditional() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "A", 5).await;
        let (order, reservation) = new_order("ref-1", &product, 1);
        let placed = store
            .commit_placement(order, &[reservation])
            .await
            .unwrap();

        let shipped = store
            .update_order_status(placed.id, OrderStatus::Pending, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.unwrap().status, OrderStatus::Shipped);

        let stale = store
            .update_order_status(placed.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_list_user_orders_pages_and_filters() {
        let store = MemoryStore::new();
        let product = seed_product(&store, "A", 50).await;
        for i in 0..12 {
            let (order, reservation) = new_order(&format!("ref-{i}"), &product, 1);
            store
                .commit_placement(order, &[reservation])
                .await
                .unwrap();
        }

        let second = store
            .list_user_orders(UserId::new(1), None, PageRequest::new(Some(2), Some(10)))
            .await
            .unwrap();
        assert_eq!(second.total, 12);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total_pages(), 2);

        let shipped = store
            .list_user_orders(
                UserId::new(1),
                Some(OrderStatus::Shipped),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(shipped.total, 0);
    }
}
