//! Product catalogue handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Product;
use crate::services::products::{ProductInput, ProductService};
use crate::state::AppState;

/// Create/update request body.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
    pub price: Decimal,
    pub stock: i64,
    pub currency: String,
}

impl From<ProductRequest> for ProductInput {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.product_name,
            description: req.product_description,
            price: req.price,
            currency: req.currency,
            stock: req.stock,
        }
    }
}

/// Public view of a product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub product_code: String,
    pub product_name: String,
    pub product_description: String,
    pub price: Decimal,
    pub currency: String,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            product_code: product.code,
            product_name: product.name,
            product_description: product.description,
            price: product.price.amount(),
            currency: product.price.currency().to_string(),
            stock: product.stock,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Envelope for single-product responses.
#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
    pub message: &'static str,
    pub product: ProductResponse,
}

/// Message-only response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Fetch one product.
///
/// # Errors
///
/// Returns 404 `Product not found`.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_principal): RequireAuth,
    Path(code): Path<String>,
) -> Result<Json<ProductEnvelope>> {
    let product = ProductService::new(state.store()).get(&code).await?;

    Ok(Json(ProductEnvelope {
        message: "Product retrieved successfully",
        product: product.into(),
    }))
}

/// Create a product (admin).
///
/// # Errors
///
/// Returns 400 for invalid input.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    payload: std::result::Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductEnvelope>)> {
    let Json(body) = payload?;

    let product = ProductService::new(state.store())
        .create(&principal, body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            message: "Product created successfully",
            product: product.into(),
        }),
    ))
}

/// Replace a product's fields (admin).
///
/// # Errors
///
/// Returns 400 for invalid input and 404 for an unknown code.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Path(code): Path<String>,
    payload: std::result::Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<ProductEnvelope>> {
    let Json(body) = payload?;

    let product = ProductService::new(state.store())
        .update(&principal, &code, body.into())
        .await?;

    Ok(Json(ProductEnvelope {
        message: "Product updated successfully",
        product: product.into(),
    }))
}

/// Soft-delete a product (admin).
///
/// # Errors
///
/// Returns 404 for an unknown code.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>> {
    ProductService::new(state.store())
        .delete(&principal, &code)
        .await?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
