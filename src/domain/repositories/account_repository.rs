//! Repository trait for identity provider accounts.

use crate::domain::entities::{Account, CreateOutcome};
use crate::error::AppError;
use async_trait::async_trait;

/// Account storage for the bundled identity provider.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::KvAccountRepository`] - key-value store implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Creates the account unless the username is taken. Never overwrites.
    async fn create(&self, account: &Account) -> Result<CreateOutcome, AppError>;

    /// Finds an account by username.
    async fn find(&self, username: &str) -> Result<Option<Account>, AppError>;
}
