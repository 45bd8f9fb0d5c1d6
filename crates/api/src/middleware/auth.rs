//! Bearer-token authentication extractors.
//!
//! Route handlers opt into authentication by taking one of these extractors:
//!
//! ```rust,ignore
//! async fn place_order(
//!     State(state): State<AppState>,
//!     RequireAuth(principal): RequireAuth,
//! ) -> Result<impl IntoResponse> { ... }
//! ```

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use instashop_core::Principal;

use crate::error::set_sentry_user;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
pub struct RequireAuth(pub Principal);

/// Extractor that requires a valid bearer token carrying the admin role.
pub struct RequireAdmin(pub Principal);

/// Error returned when a request fails authentication or authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingHeader,
    /// Token malformed, expired, or badly signed.
    InvalidToken,
    /// Authenticated, but not an administrator.
    Forbidden,
}

impl AuthRejection {
    const fn status(self) -> StatusCode {
        match self {
            Self::MissingHeader | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header missing",
            Self::InvalidToken => "Invalid token",
            Self::Forbidden => "You do not have the right to access this resource",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = json!({
            "error": true,
            "error_message": self.message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthRejection> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthRejection::MissingHeader)?
        .to_str()
        .map_err(|_| AuthRejection::InvalidToken)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthRejection::InvalidToken)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let principal = state
            .tokens()
            .verify(token)
            .map_err(|_| AuthRejection::InvalidToken)?;

        tracing::Span::current().record("user_id", principal.identity.as_str());
        set_sentry_user(&principal.identity);

        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            tracing::warn!(user = %principal.identity, "Non-admin request to admin route");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(principal))
    }
}
