//! Instashop Core - Shared domain types.
//!
//! This crate provides the types used across all Instashop components:
//! - `api` - HTTP service for users, products, and orders
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Exact decimal pricing and the order status lifecycle live
//! here so they can be tested without any infrastructure.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, currencies, prices, statuses, principals,
//!   and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
