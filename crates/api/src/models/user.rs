//! User domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use instashop_core::{CurrencyCode, Email, Role, UserId};

/// A registered account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Internal primary key.
    pub id: UserId,
    /// Public identifier, carried as the `sub` claim of bearer tokens.
    pub public_id: Uuid,
    /// Login email.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// Currency every order of this user is priced in. Fixed at signup.
    pub currency: CurrencyCode,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub currency: CurrencyCode,
    pub role: Role,
}
