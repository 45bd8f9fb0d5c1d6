//! HS256 bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use instashop_core::{Principal, Role};

use super::AuthError;
use crate::config::TokenConfig;
use crate::models::User;

/// Token claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Public user identifier.
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
    iss: String,
}

/// A freshly issued token and its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub issuer: String,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub user_id: String,
}

/// Signs and verifies bearer tokens.
///
/// Implements `Debug` manually so the keys never reach logs.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("keys", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Build an issuer from configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        let secret = config.secret_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            ttl: Duration::hours(config.ttl_hours),
        }
    }

    /// Issue a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if encoding fails.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let issued = Utc::now();
        let expires = issued + self.ttl;
        let claims = Claims {
            sub: user.public_id.to_string(),
            role: user.role,
            iat: issued.timestamp(),
            exp: expires.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken {
            token,
            issuer: self.issuer.clone(),
            issued,
            expires,
            user_id: claims.sub,
        })
    }

    /// Verify a token's signature, expiry and issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any verification failure.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            AuthError::InvalidToken
        })?;

        Ok(Principal::new(data.claims.sub, data.claims.role))
    }
}
