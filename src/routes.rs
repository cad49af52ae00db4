//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{short_key}` - Short key redirect (public)
//! - `GET  /health`      - Health check: store, visit queue (public)
//! - `POST /signup`, `POST /login` - Accounts (public)
//! - `POST /shorten`, `/urls/*` - Bearer token resolved into a principal
//!
//! Static segments take priority over `/{short_key}`, and the matching words
//! are reserved by [`crate::utils::key_codec::is_reserved`] so no key can be
//! shadowed by a route.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Authentication** - Bearer token on the authenticated routes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with every route and middleware except path normalization.
pub fn router(state: AppState) -> Router {
    let authenticated = api::routes::authenticated_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{short_key}", get(redirect_handler))
        .route("/health", get(health_handler))
        .merge(api::routes::public_routes())
        .merge(authenticated)
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application service: [`router`] with trailing slashes trimmed.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
