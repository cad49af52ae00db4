//! DTOs for account signup and login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body of `POST /signup` and `POST /login`.
///
/// Format rules live in [`crate::application::services::AccountService`] so
/// the CLI and the HTTP API enforce the same ones.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Issued bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}
