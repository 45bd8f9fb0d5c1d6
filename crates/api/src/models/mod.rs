//! Domain models for the API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, Order, OrderItem, OrderLine, Reservation};
pub use product::{NewProduct, Product};
pub use user::{NewUser, User};
