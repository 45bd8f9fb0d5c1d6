//! Authentication service.
//!
//! Password signup and login, and the bearer tokens that carry the resulting
//! principal.

mod error;
mod tokens;

pub use error::AuthError;
pub use tokens::{IssuedToken, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use instashop_core::{CurrencyCode, Email, Role};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Signup form fields, unvalidated.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub currency: String,
}

/// Authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
    tokens: &'a TokenIssuer,
}

impl<'a, S: Store> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S, tokens: &'a TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Register a customer account.
    ///
    /// The role is always [`Role::User`]; administrators are created from
    /// the CLI.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: SignupInput) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;
        let first_name = required(&input.first_name, "first_name")?;
        let last_name = required(&input.last_name, "last_name")?;
        let currency = CurrencyCode::parse(&input.currency)?;
        validate_password(&input.password)?;
        if input.password != input.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                first_name,
                last_name,
                currency,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password, returning a signed token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .user_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        self.tokens.issue(&user)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}

/// Check a password against the minimum strength rules.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::TokenConfig;
    use crate::db::MemoryStore;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6~"),
            issuer: "instashop".to_owned(),
            ttl_hours: 24,
        })
    }

    fn signup(email: &str, password: &str, confirm: &str) -> SignupInput {
        SignupInput {
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm.to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Obi".to_owned(),
            currency: "ngn".to_owned(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = MemoryStore::new();
        let tokens = issuer();
        let service = AuthService::new(&store, &tokens);

        let user = service
            .signup(signup("Ada@Example.com", "password1", "password1"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.currency.as_str(), "NGN");

        let issued = service.login("ada@example.com", "password1").await.unwrap();
        let principal = tokens.verify(&issued.token).unwrap();
        assert_eq!(principal.identity, user.public_id.to_string());

        assert!(matches!(
            service.login("ada@example.com", "password2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "password1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let store = MemoryStore::new();
        let tokens = issuer();
        let service = AuthService::new(&store, &tokens);

        assert!(matches!(
            service.signup(signup("ada@example.com", "short", "short")).await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            service
                .signup(signup("ada@example.com", "password1", "password2"))
                .await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            service.signup(signup("not-an-email", "password1", "password1")).await,
            Err(AuthError::InvalidEmail(_))
        ));

        service
            .signup(signup("ada@example.com", "password1", "password1"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .signup(signup("ada@example.com", "password1", "password1"))
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }
}
