//! URL record entity representing a short key mapping.

use chrono::{DateTime, Utc};

/// A stored mapping from a short key to its original URL.
///
/// `short_key` is the primary key. `creator` is `None` for anonymous
/// creation; `expires_at` is `None` for records that never expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub short_key: String,
    pub original_url: String,
    pub creator: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl UrlRecord {
    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Returns true if `principal` created this record.
    pub fn is_owned_by(&self, principal: &str) -> bool {
        self.creator.as_deref() == Some(principal)
    }
}

/// Input data for a record whose short key is not yet allocated.
#[derive(Debug, Clone)]
pub struct NewUrlRecord {
    pub original_url: String,
    pub creator: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewUrlRecord {
    /// Binds the draft to a concrete short key.
    pub fn with_key(&self, short_key: String, created_at: DateTime<Utc>) -> UrlRecord {
        UrlRecord {
            short_key,
            original_url: self.original_url.clone(),
            creator: self.creator.clone(),
            created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Result of an atomic create-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}
