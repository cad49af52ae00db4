//! Account entity used by the bundled identity provider.

use chrono::{DateTime, Utc};

/// A registered user able to obtain bearer tokens.
///
/// Only the argon2 PHC string of the password is kept.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
