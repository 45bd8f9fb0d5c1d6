//! Order placement, listing and lifecycle handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use instashop_core::{OrderStatus, PageRequest};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderItem, OrderLine};
use crate::services::orders::OrderService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// One requested line.
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_code: String,
    pub product_quantity: i64,
}

/// Place-order request body.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    pub order_reference: String,
    #[serde(default)]
    pub products: Vec<OrderLineRequest>,
}

/// Admin status change body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub order_status: String,
}

/// Listing query string.
///
/// Everything arrives as text: junk paging values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub order_status: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        PageRequest::new(parse(&self.page), parse(&self.size))
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// One line of an order.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_code: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub currency: String,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_code: item.product_code,
            product_name: item.product_name,
            currency: item.unit_price.currency().to_string(),
            unit_price: item.unit_price.amount(),
            quantity: item.quantity,
            line_total: item.line_total.amount(),
        }
    }
}

/// Public view of an order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_reference: String,
    pub order_status: OrderStatus,
    pub total_price: Decimal,
    pub currency: String,
    pub products: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_reference: order.reference,
            order_status: order.status,
            total_price: order.total.amount(),
            currency: order.total.currency().to_string(),
            products: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Envelope for single-order responses.
#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    pub message: &'static str,
    pub order: OrderResponse,
}

/// Paged listing response.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub message: &'static str,
    pub orders: Vec<OrderResponse>,
    pub total_orders: u64,
    pub total_pages: u64,
    pub page: u32,
    pub size: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Place an order for the caller.
///
/// # Errors
///
/// Returns 400 for validation failures (unknown product, stock, currency),
/// 409 for a duplicate reference.
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    payload: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderEnvelope>)> {
    let Json(body) = payload?;

    let lines: Vec<OrderLine> = body
        .products
        .into_iter()
        .map(|p| OrderLine::new(p.product_code, p.product_quantity))
        .collect();

    let order = OrderService::new(state.store())
        .place(&principal, &body.order_reference, &lines)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            message: "Order placed successfully",
            order: order.into(),
        }),
    ))
}

/// List the caller's orders, newest first.
///
/// # Errors
///
/// Returns 400 for an unrecognised `order_status` filter.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<OrderListResponse>> {
    let Query(query) = query?;
    let request = query.page_request();

    let page = OrderService::new(state.store())
        .list(&principal, query.order_status.as_deref(), request)
        .await?;

    let total_pages = page.total_pages();
    let message = if page.items.is_empty() {
        "No orders found"
    } else {
        "Order retrieved successfully"
    };

    Ok(Json(OrderListResponse {
        message,
        total_orders: page.total,
        total_pages,
        page: request.page(),
        size: request.size(),
        orders: page.items.into_iter().map(Into::into).collect(),
    }))
}

/// Cancel one of the caller's pending orders.
///
/// # Errors
///
/// Returns 404 for an unknown reference, 403 for someone else's order and
/// 400 unless the order is still pending.
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(reference): Path<String>,
) -> Result<Json<OrderEnvelope>> {
    let order = OrderService::new(state.store())
        .cancel(&principal, &reference)
        .await?;

    Ok(Json(OrderEnvelope {
        message: "Order cancelled successfully",
        order: order.into(),
    }))
}

/// Move an order to a new status (admin).
///
/// # Errors
///
/// Returns 400 for an unknown status or a forbidden transition and 404 for
/// an unknown reference.
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Path(reference): Path<String>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<OrderEnvelope>> {
    let Json(body) = payload?;

    let order = OrderService::new(state.store())
        .set_status(&principal, &reference, &body.order_status)
        .await?;

    Ok(Json(OrderEnvelope {
        message: "Order status updated successfully",
        order: order.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, size: Option<&str>) -> ListQuery {
        ListQuery {
            order_status: None,
            page: page.map(String::from),
            size: size.map(String::from),
        }
    }

    #[test]
    fn test_paging_parses_leniently() {
        let req = query(Some("2"), Some("5")).page_request();
        assert_eq!((req.page(), req.size()), (2, 5));

        let req = query(Some("abc"), Some("-3")).page_request();
        assert_eq!((req.page(), req.size()), (1, 10));

        let req = query(None, Some("1000")).page_request();
        assert_eq!(req.size(), PageRequest::MAX_SIZE);
    }
}
