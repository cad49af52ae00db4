//! Store key layout.
//!
//! ```text
//! url:{key}              hash    original_url, creator, created_at, expires_at
//! clicks:{key}           string  visit counter
//! visitors:{key}         set     visitor ids
//! user:{principal}:urls  set     keys created by the principal
//! account:{username}     hash    password_hash, created_at
//! ```

use chrono::{DateTime, Utc};

use crate::domain::store::FieldGuard;

/// Record hash field holding the creation time, which identifies one
/// generation of a short key.
pub const CREATED_AT: &str = "created_at";

pub fn record(short_key: &str) -> String {
    format!("url:{}", short_key)
}

pub fn clicks(short_key: &str) -> String {
    format!("clicks:{}", short_key)
}

pub fn visitors(short_key: &str) -> String {
    format!("visitors:{}", short_key)
}

pub fn owner_index(principal: &str) -> String {
    format!("user:{}:urls", principal)
}

pub fn account(username: &str) -> String {
    format!("account:{}", username)
}

/// Analytics entities that share a record's lifetime.
pub fn companions(short_key: &str) -> [String; 2] {
    [clicks(short_key), visitors(short_key)]
}

/// Guard that holds only while `url:{key}` is the record created at
/// `created_at`, not a deleted or re-created one.
pub fn generation_guard(short_key: &str, created_at: DateTime<Utc>) -> FieldGuard {
    FieldGuard {
        key: record(short_key),
        field: CREATED_AT.to_string(),
        value: created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(record("abc"), "url:abc");
        assert_eq!(clicks("abc"), "clicks:abc");
        assert_eq!(visitors("abc"), "visitors:abc");
        assert_eq!(owner_index("alice"), "user:alice:urls");
        assert_eq!(account("alice"), "account:alice");
    }

    #[test]
    fn test_generation_guard_targets_record_hash() {
        let created_at = Utc::now();
        let guard = generation_guard("abc", created_at);

        assert_eq!(guard.key, "url:abc");
        assert_eq!(guard.field, CREATED_AT);
        assert_eq!(guard.value, created_at.to_rfc3339());
    }
}
