//! Integration tests for Instashop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p instashop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_placement` - Placement scenarios and the no-oversell property
//! - `order_lifecycle` - Cancellation, admin transitions and listing
//! - `http_api` - Routing, authentication and error bodies over HTTP
//!
//! Service-level tests run against [`MemoryStore`]. HTTP tests use a lazily
//! connected pool and only exercise paths that are decided before any query
//! runs, so none of them need a database.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use uuid::Uuid;

use instashop_api::config::{ApiConfig, TokenConfig};
use instashop_api::db::{MemoryStore, Store};
use instashop_api::models::{NewProduct, NewUser, Product, User};
use instashop_api::services::auth::TokenIssuer;
use instashop_core::{CurrencyCode, Email, Price, Principal, Role};

/// Signing secret used by every test token.
pub const TEST_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6~";

/// A price in `currency` from a decimal literal.
pub fn price(amount: &str, currency: &str) -> Price {
    Price::new(
        Decimal::from_str(amount).unwrap(),
        CurrencyCode::parse(currency).unwrap(),
    )
    .unwrap()
}

/// Create a live account.
pub async fn create_user(store: &MemoryStore, email: &str, currency: &str, role: Role) -> User {
    store
        .create_user(NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: "not-a-real-hash".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Obi".to_owned(),
            currency: CurrencyCode::parse(currency).unwrap(),
            role,
        })
        .await
        .unwrap()
}

/// Create a product owned by `owner`.
pub async fn create_product(
    store: &MemoryStore,
    owner: &User,
    code: &str,
    amount: &str,
    currency: &str,
    stock: u32,
) -> Product {
    store
        .create_product(
            owner.id,
            code.to_owned(),
            NewProduct {
                name: format!("Product {code}"),
                description: String::new(),
                price: price(amount, currency),
                stock,
            },
        )
        .await
        .unwrap()
}

/// Current stock of a live product.
pub async fn stock_of(store: &MemoryStore, code: &str) -> u32 {
    store.product_by_code(code).await.unwrap().unwrap().stock
}

/// The principal a token for `user` would verify to.
pub fn principal_for(user: &User) -> Principal {
    Principal::new(user.public_id.to_string(), user.role)
}

/// Token settings shared by the HTTP tests.
pub fn token_config() -> TokenConfig {
    TokenConfig {
        secret: SecretString::from(TEST_SECRET),
        issuer: "instashop".to_owned(),
        ttl_hours: 1,
    }
}

/// Configuration for an app that is never actually bound to a socket.
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://instashop@localhost:5432/instashop_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        tokens: token_config(),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A bearer token for a user that exists only inside the token.
pub fn bearer_for(role: Role) -> String {
    let user = User {
        id: instashop_core::UserId::new(1),
        public_id: Uuid::new_v4(),
        email: Email::parse("ada@example.com").unwrap(),
        first_name: "Ada".to_owned(),
        last_name: "Obi".to_owned(),
        currency: CurrencyCode::parse("NGN").unwrap(),
        role,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let issued = TokenIssuer::new(&token_config()).issue(&user).unwrap();
    format!("Bearer {}", issued.token)
}
