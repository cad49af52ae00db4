//! Handlers for managing the caller's records.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Duration;
use validator::Validate;

use crate::api::dto::urls::{ExpireRequest, ExpireResponse, UrlListResponse, UrlSummary};
use crate::api::middleware::auth::CurrentUser;
use crate::domain::entities::UrlRecord;
use crate::error::AppError;
use crate::state::AppState;

async fn summarize(state: &AppState, record: UrlRecord) -> Result<UrlSummary, AppError> {
    let stats = state.analytics.stats(&record.short_key).await?;
    let short_url = state
        .link_service
        .get_short_url(&state.base_url, &record.short_key);

    Ok(UrlSummary::new(record, short_url, stats))
}

/// Lists the caller's records with their click statistics.
///
/// # Endpoint
///
/// `GET /urls`
///
/// Expired records still referenced by the caller's index are left out.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<UrlListResponse>, AppError> {
    let records = state.link_service.list_owned(&principal.id).await?;

    let mut items = Vec::with_capacity(records.len());
    for record in records {
        items.push(summarize(&state, record).await?);
    }

    Ok(Json(UrlListResponse {
        total: items.len(),
        items,
    }))
}

/// Returns one owned record with its click statistics.
///
/// # Endpoint
///
/// `GET /urls/{short_key}/stats`
///
/// # Errors
///
/// - 403 Forbidden: the record belongs to someone else or is anonymous
/// - 404 Not Found: unknown or expired key
pub async fn url_stats_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(short_key): Path<String>,
) -> Result<Json<UrlSummary>, AppError> {
    let record = state
        .link_service
        .get_owned(&short_key, &principal.id)
        .await?;

    Ok(Json(summarize(&state, record).await?))
}

/// Sets a new time-to-live on an owned record and its statistics.
///
/// # Endpoint
///
/// `POST /urls/{short_key}/expire`
///
/// # Request Body
///
/// ```json
/// { "ttl_seconds": 3600 }
/// ```
///
/// # Errors
///
/// Same as [`url_stats_handler`], plus 400 for a TTL outside 1s..10 years.
pub async fn expire_url_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(short_key): Path<String>,
    Json(body): Json<ExpireRequest>,
) -> Result<Json<ExpireResponse>, AppError> {
    body.validate()?;

    let expires_at = state
        .link_service
        .expire(
            &short_key,
            &principal.id,
            Duration::seconds(body.ttl_seconds as i64),
        )
        .await?;

    Ok(Json(ExpireResponse {
        short_key,
        expires_at,
    }))
}

/// Deletes an owned record together with its statistics.
///
/// # Endpoint
///
/// `DELETE /urls/{short_key}`
///
/// # Response
///
/// `204 No Content`
pub async fn delete_url_handler(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(short_key): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .link_service
        .delete(&short_key, &principal.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
