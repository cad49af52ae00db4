//! Bearer token authentication middleware and principal extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{domain::identity::Principal, error::AppError, state::AppState};

/// Resolves an optional bearer credential into a [`Principal`].
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Requests without an `Authorization` header pass through anonymously;
/// handlers decide whether that is acceptable via [`CurrentUser`] or
/// [`MaybeUser`]. A header that is present but malformed, or a token the
/// identity provider rejects, is answered here.
///
/// # Errors
///
/// Returns `401 Unauthorized` (with `WWW-Authenticate: Bearer`) if:
/// - The header is not a Bearer credential
/// - The token signature is invalid or the token has expired
///
/// # Example
///
/// ```rust,ignore
/// let api = Router::new()
///     .route("/urls", get(list_urls_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    if parts.headers.contains_key(header::AUTHORIZATION) {
        let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Authorization header is not a Bearer credential"}),
                )
            })?;

        let principal = st.identity.authenticate(&token).await?;
        parts.extensions.insert(principal);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// The authenticated caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Authorization header is missing"}),
                )
            })
    }
}

/// The caller if a valid credential was supplied, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<Principal>().cloned()))
    }
}
