//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup, password login, bearer tokens
//! - `products` - Catalogue management
//! - `orders` - Order placement, inventory reservation, lifecycle
//!
//! Every service borrows a [`crate::db::Store`], so the same logic runs over
//! `PostgreSQL` in production and over the in-memory store in tests.

pub mod auth;
pub mod orders;
pub mod products;
