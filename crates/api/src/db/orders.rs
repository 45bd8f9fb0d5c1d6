//! Order repository for database operations.
//!
//! Placement is the only multi-statement write in the schema: the order row,
//! its items and every stock decrement commit together or not at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use instashop_core::{
    CurrencyCode, OrderId, OrderStatus, Page, PageRequest, Price, PriceError, ProductId, UserId,
};

use super::products::stock_to_i32;
use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewOrder, Order, OrderItem, Reservation};

/// Base select for orders. Every read starts from here so the soft-delete
/// filter cannot be forgotten.
const LIVE_ORDERS: &str = "SELECT id, user_id, order_reference, order_status, total_price, \
                           currency, created_at, updated_at \
                           FROM instashop.\"order\" WHERE is_deleted = FALSE";

const ORDER_RETURNING: &str = "RETURNING id, user_id, order_reference, order_status, \
                               total_price, currency, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_reference: String,
    order_status: OrderStatus,
    total_price: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let currency = parse_currency(&self.currency)?;
        let total = Price::new(self.total_price, currency).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order total in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            reference: self.order_reference,
            status: self.order_status,
            total,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    product_id: i32,
    product_code: String,
    product_name: String,
    unit_price: Decimal,
    currency: String,
    quantity: i32,
    line_total: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let currency = parse_currency(&row.currency)?;
        let corrupt = |e: PriceError| {
            RepositoryError::DataCorruption(format!("invalid order item price: {e}"))
        };

        Ok(Self {
            product_id: ProductId::new(row.product_id),
            product_code: row.product_code,
            product_name: row.product_name,
            unit_price: Price::new(row.unit_price, currency.clone()).map_err(corrupt)?,
            quantity: u32::try_from(row.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("invalid quantity: {}", row.quantity))
            })?,
            line_total: Price::new(row.line_total, currency).map_err(corrupt)?,
        })
    }
}

fn parse_currency(code: &str) -> Result<CurrencyCode, RepositoryError> {
    CurrencyCode::parse(code)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid currency in database: {e}")))
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a live order and its items by reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored column is invalid.
    pub async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{LIVE_ORDERS} AND order_reference = $1"))
                .bind(reference)
                .fetch_optional(self.pool)
                .await?;

        match row {
            Some(row) => {
                let items = self.items_for(&[row.id]).await?.remove(&row.id);
                row.into_order(items.unwrap_or_default()).map(Some)
            }
            None => Ok(None),
        }
    }

    /// List a user's live orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM instashop.\"order\" \
             WHERE is_deleted = FALSE AND user_id = $1 \
               AND ($2::instashop.order_status IS NULL OR order_status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{LIVE_ORDERS} AND user_id = $1 \
               AND ($2::instashop.order_status IS NULL OR order_status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(i64::from(page.size()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;
        let orders = rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items: orders,
            total: u64::try_from(total).unwrap_or_default(),
            request: page,
        })
    }

    /// Place an order: insert it in `Pending` status, apply every stock
    /// reservation with a conditional decrement, and insert its items, all
    /// in one transaction.
    ///
    /// Products are decremented in ascending id order so two placements that
    /// touch the same products always lock them in the same order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the reference already exists.
    /// Returns `RepositoryError::InsufficientStock` if a decrement would take
    /// stock below zero.
    /// Returns `RepositoryError::NotFound` if a reserved product was deleted.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place(
        &self,
        order: &NewOrder,
        reservations: &[Reservation],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO instashop.\"order\" \
                 (user_id, order_reference, order_status, total_price, currency) \
             VALUES ($1, $2, $3, $4, $5) \
             {ORDER_RETURNING}"
        ))
        .bind(order.user_id)
        .bind(&order.reference)
        .bind(OrderStatus::Pending)
        .bind(order.total.amount())
        .bind(order.total.currency().as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order reference"))?;

        let mut ordered: Vec<&Reservation> = reservations.iter().collect();
        ordered.sort_by_key(|r| r.product_id);
        for reservation in ordered {
            decrement_stock(&mut tx, reservation).await?;
        }

        for item in &order.items {
            sqlx::query(
                "INSERT INTO instashop.order_item \
                     (order_id, product_id, product_code, product_name, unit_price, currency, \
                      quantity, line_total) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.product_code)
            .bind(&item.product_name)
            .bind(item.unit_price.amount())
            .bind(item.unit_price.currency().as_str())
            .bind(stock_to_i32(item.quantity)?)
            .bind(item.line_total.amount())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.into_order(order.items.clone())
    }

    /// Move a live order from `expected` to `next`.
    ///
    /// Returns `None` if the order is gone or no longer in `expected` status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE instashop.\"order\" SET order_status = $3, updated_at = NOW() \
             WHERE id = $1 AND order_status = $2 AND is_deleted = FALSE \
             {ORDER_RETURNING}"
        ))
        .bind(id)
        .bind(expected)
        .bind(next)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for(&[row.id]).await?.remove(&row.id);
                row.into_order(items.unwrap_or_default()).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Load items for a set of orders, grouped by order id and kept in
    /// insertion order.
    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT order_id, product_id, product_code, product_name, unit_price, currency, \
                    quantity, line_total \
             FROM instashop.order_item \
             WHERE order_id = ANY($1) AND is_deleted = FALSE \
             ORDER BY order_id, id",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }
        Ok(grouped)
    }
}

/// Conditionally decrement one product's stock inside the placement
/// transaction.
async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    reservation: &Reservation,
) -> Result<(), RepositoryError> {
    let quantity = stock_to_i32(reservation.quantity)?;

    let remaining: Option<i32> = sqlx::query_scalar(
        "UPDATE instashop.product SET stock = stock - $2, updated_at = NOW() \
         WHERE id = $1 AND is_deleted = FALSE AND stock >= $2 \
         RETURNING stock",
    )
    .bind(reservation.product_id)
    .bind(quantity)
    .fetch_optional(&mut **tx)
    .await?;

    if remaining.is_some() {
        return Ok(());
    }

    let current: Option<i32> = sqlx::query_scalar(
        "SELECT stock FROM instashop.product WHERE id = $1 AND is_deleted = FALSE",
    )
    .bind(reservation.product_id)
    .fetch_optional(&mut **tx)
    .await?;

    tracing::warn!(
        product_code = %reservation.product_code,
        requested = reservation.quantity,
        available = ?current,
        "Conditional stock decrement rejected"
    );

    Err(match current {
        Some(stock) => RepositoryError::InsufficientStock {
            code: reservation.product_code.clone(),
            available: u32::try_from(stock).unwrap_or_default(),
        },
        None => RepositoryError::ProductGone {
            code: reservation.product_code.clone(),
        },
    })
}
