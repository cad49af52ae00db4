//! Handlers for account signup and login.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::auth::{CredentialsRequest, SignupResponse, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Registers a new account.
///
/// # Endpoint
///
/// `POST /signup`
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "password": "correct horse battery" }
/// ```
///
/// # Errors
///
/// - 400 Bad Request: username is not 3-32 chars of `[A-Za-z0-9_.-]`, or
///   password is not 8-128 chars
/// - 409 Conflict: username already taken
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let account = state
        .account_service
        .register(&body.username, &body.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            username: account.username,
            created_at: account.created_at,
        }),
    ))
}

/// Exchanges credentials for a bearer token.
///
/// # Endpoint
///
/// `POST /login`
///
/// # Errors
///
/// Returns 401 Unauthorized for an unknown username or wrong password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .account_service
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
    }))
}
