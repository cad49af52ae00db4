//! Handler for short key redirects.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short key to its original URL.
///
/// # Endpoint
///
/// `GET /{short_key}`
///
/// # Visit Tracking
///
/// The visitor id is derived from the peer address, or from
/// `X-Forwarded-For` / `X-Real-IP` when the service runs behind a proxy, and
/// is fingerprinted when a visitor hash secret is configured. The visit is
/// queued for the background worker, so the redirect never waits on analytics.
///
/// # Response
///
/// `302 Found` with a `Location` header.
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown or expired.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_key): Path<String>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, peer, state.behind_proxy);
    let visitor_id = state.fingerprinter.fingerprint(ip);

    let original_url = state
        .resolution_service
        .resolve(&short_key, &visitor_id)
        .await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, original_url)]))
}
