//! Signup and login handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use instashop_core::Role;

use crate::error::Result;
use crate::models::User;
use crate::services::auth::{AuthService, IssuedToken, SignupInput};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub user_currency: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_currency: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.public_id.to_string(),
            email: user.email.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_currency: user.currency.to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Signup response body.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a customer account.
///
/// # Errors
///
/// Returns 400 for invalid input and 409 if the email is taken.
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let Json(body) = payload?;

    let tokens = state.tokens();
    let user = AuthService::new(state.store(), tokens)
        .signup(SignupInput {
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
            first_name: body.first_name,
            last_name: body.last_name,
            currency: body.user_currency,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user: UserResponse::from(&user),
        }),
    ))
}

/// Exchange email and password for a bearer token.
///
/// # Errors
///
/// Returns 401 `Invalid credentials` on any mismatch.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedToken>> {
    let Json(body) = payload?;

    let issued = AuthService::new(state.store(), state.tokens())
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(issued))
}
