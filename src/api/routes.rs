//! API route configuration.
//!
//! Routes in [`authenticated_routes`] run behind
//! [`crate::api::middleware::auth::layer`], which resolves an optional bearer
//! token into a principal. Each handler then decides whether a principal is
//! required.

use crate::api::handlers::{
    delete_url_handler, expire_url_handler, list_urls_handler, login_handler, shorten_handler,
    signup_handler, url_stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Account routes, reachable without a credential.
///
/// # Endpoints
///
/// - `POST /signup` - Register an account
/// - `POST /login`  - Exchange credentials for a bearer token
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
}

/// Routes that read the caller's principal.
///
/// # Endpoints
///
/// - `POST   /shorten`                  - Create a short URL
/// - `GET    /urls`                     - List the caller's records
/// - `GET    /urls/{short_key}/stats`   - Record and click statistics
/// - `POST   /urls/{short_key}/expire`  - Set a new time-to-live
/// - `DELETE /urls/{short_key}`         - Delete a record and its statistics
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/urls", get(list_urls_handler))
        .route("/urls/{short_key}/stats", get(url_stats_handler))
        .route("/urls/{short_key}/expire", post(expire_url_handler))
        .route("/urls/{short_key}", delete(delete_url_handler))
}
