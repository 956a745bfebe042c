/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Logout
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and receive a session token
/// - `POST /v1/auth/logout` - Invalidate the current session
///
/// Sessions are opaque bearer tokens held in the in-memory session
/// store; an expired session behaves exactly like no session at all.

use crate::{
    app::{AppState, AuthContext},
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use tidylist_shared::{
    auth::password,
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Must match `password`
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// User ID
    pub user_id: String,

    /// Opaque session token; send as `Authorization: Bearer <token>`
    pub session_token: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Whether the session was ended
    pub logged_out: bool,
}

/// Register a new user
///
/// Creates the account and immediately starts a session.
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    if req.password != req.confirm_password {
        return Err(ApiError::validation(
            "confirm_password",
            "Passwords do not match",
        ));
    }

    // Hash password
    let password_hash = password::hash_password(&req.password)?;

    // A duplicate email surfaces as a unique violation and maps to 409
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let session_token = state.sessions.create(user.id);

    tracing::info!(user_id = %user.id, "New user registered");

    Ok(Json(SessionResponse {
        user_id: user.id.to_string(),
        session_token,
    }))
}

/// Login endpoint
///
/// Verifies credentials and starts a session.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials (the message does not say
///   whether the email or the password was wrong)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    // Find user by email
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    // Verify password
    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let session_token = state.sessions.create(user.id);

    Ok(Json(SessionResponse {
        user_id: user.id.to_string(),
        session_token,
    }))
}

/// Logout endpoint
///
/// Invalidates the session the request authenticated with. Invalidating
/// is idempotent, so a racing double-logout still succeeds.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<LogoutResponse>> {
    state.sessions.invalidate(&auth.token);

    Ok(Json(LogoutResponse { logged_out: true }))
}
