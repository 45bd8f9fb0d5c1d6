//! Administrator account commands.
//!
//! Signup over HTTP always creates customers; this is the only way to get
//! an account with the admin role.
//!
//! # Environment Variables
//!
//! - `INSTASHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_PASSWORD` - Password for the new account (never taken from argv)

use sqlx::PgPool;
use thiserror::Error;

use instashop_api::db::{PgStore, RepositoryError, Store};
use instashop_api::models::NewUser;
use instashop_api::services::auth::{AuthError, hash_password, validate_password};
use instashop_core::{CurrencyCode, Email, Role};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid currency code.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Empty name.
    #[error("{0} is required")]
    MissingName(&'static str),

    /// Password rejected or could not be hashed.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// Storage error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new administrator.
///
/// # Returns
///
/// The public ID of the created account.
///
/// # Errors
///
/// Returns `AdminError` for invalid input, a missing password, a taken email
/// or database failures.
pub async fn create_admin(
    email: &str,
    first_name: &str,
    last_name: &str,
    currency: &str,
) -> Result<String, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let currency =
        CurrencyCode::parse(currency).map_err(|_| AdminError::InvalidCurrency(currency.to_owned()))?;
    let first_name = non_empty(first_name, "first name")?;
    let last_name = non_empty(last_name, "last name")?;

    let password =
        std::env::var("ADMIN_PASSWORD").map_err(|_| AdminError::MissingEnvVar("ADMIN_PASSWORD"))?;
    validate_password(&password)?;
    let password_hash = hash_password(&password)?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("INSTASHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;
    let store = PgStore::new(pool);

    tracing::info!("Creating administrator: {}", email);

    let user = store
        .create_user(NewUser {
            email: email.clone(),
            password_hash,
            first_name,
            last_name,
            currency,
            role: Role::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Administrator created successfully! ID: {}, Email: {}",
        user.public_id,
        user.email
    );

    Ok(user.public_id.to_string())
}

fn non_empty(value: &str, field: &'static str) -> Result<String, AdminError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AdminError::MissingName(field));
    }
    Ok(value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty("  Ada ", "first name").ok().as_deref(), Some("Ada"));
        assert!(matches!(
            non_empty("   ", "last name"),
            Err(AdminError::MissingName("last name"))
        ));
    }
}
