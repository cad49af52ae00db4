//! Identity provider capability.

use async_trait::async_trait;

use crate::error::AppError;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Issues bearer credentials and turns them back into principals.
///
/// The core never inspects credentials itself; it only consumes this trait.
///
/// # Implementations
///
/// - [`crate::infrastructure::identity::JwtIdentityProvider`] - HS256 JWT validation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed, expired,
    /// or not signed by this provider.
    async fn authenticate(&self, token: &str) -> Result<Principal, AppError>;

    /// Issues a credential whose subject is `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    fn issue(&self, subject: &str) -> Result<String, AppError>;
}
