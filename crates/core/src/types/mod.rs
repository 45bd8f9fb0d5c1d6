//! Core types for Instashop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod page;
pub mod price;
pub mod principal;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use page::{Page, PageRequest};
pub use price::{CurrencyCode, CurrencyError, Price, PriceError};
pub use principal::{Principal, Role, RoleError};
pub use status::{OrderStatus, TransitionError, UnknownStatus};
