//! Handler for URL shortening endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use chrono::Duration;
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::ShortenParams;
use crate::api::middleware::auth::MaybeUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /shorten?url=<url>[&slug=<key>][&ttl_seconds=<n>]`
///
/// # Authentication
///
/// A bearer token is required unless anonymous creation is enabled. When a
/// valid token is supplied the caller becomes the record's creator and the
/// key is added to their URL list.
///
/// # Response
///
/// `201 Created` with a plain-text body:
///
/// ```text
/// Short URL created: http://localhost:8080/aB3x_9Qz
/// ```
///
/// # Errors
///
/// - 400 Bad Request: missing or invalid URL, invalid slug or TTL
/// - 401 Unauthorized: credential required but missing or invalid
/// - 409 Conflict: the slug is already taken
/// - 503 Service Unavailable: no generated key could be claimed (retryable)
pub async fn shorten_handler(
    State(state): State<AppState>,
    MaybeUser(principal): MaybeUser,
    Query(params): Query<ShortenParams>,
) -> Result<(StatusCode, String), AppError> {
    if state.require_auth && principal.is_none() {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "Authorization header is missing"}),
        ));
    }

    params.validate()?;

    let url = params.url.unwrap_or_default();
    let ttl = params
        .ttl_seconds
        .map(|secs| Duration::seconds(secs as i64));

    let record = state
        .link_service
        .create_short_link(&url, params.slug, principal.map(|p| p.id), ttl)
        .await?;

    let short_url = state
        .link_service
        .get_short_url(&state.base_url, &record.short_key);

    Ok((
        StatusCode::CREATED,
        format!("Short URL created: {short_url}"),
    ))
}
