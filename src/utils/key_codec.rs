//! Short key derivation and validation.
//!
//! A generated key is the URL-safe base64 encoding of
//! `SHA-256(timestamp_nanos || nonce)`, truncated to the configured length.
//! Every character of the truncated output carries 6 uniform bits, so a
//! candidate is uniform over `64^len` values.
//!
//! # Collision bound
//!
//! With `n` live keys a single candidate collides with probability
//! `n / 64^len`; all `N` allocation attempts collide with probability
//! `(n / 64^len)^N`. At the default length of 8 (`64^8 = 2^48`) and one
//! billion live keys a single attempt collides with probability ~3.6e-6 and
//! five consecutive attempts with ~6e-28.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::AppError;

pub const DEFAULT_KEY_LENGTH: usize = 8;
pub const MIN_KEY_LENGTH: usize = 6;
pub const MAX_KEY_LENGTH: usize = 16;

/// Upper bound for caller-supplied keys.
pub const MAX_CUSTOM_KEY_LENGTH: usize = 16;

/// Words that collide with fixed routes and can never be short keys.
const RESERVED_KEYS: &[&str] = &["shorten", "signup", "login", "health", "urls", "api"];

/// Characters that are printable but would be cut off or re-interpreted in a
/// URL path segment.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '?', '#', '%', '\\'];

/// Derives a key candidate. Pure and deterministic.
///
/// Output uses the alphabet `[A-Za-z0-9_-]` and is at most 43 characters
/// (the full digest) regardless of `len`.
pub fn encode(timestamp_nanos: i64, nonce: u64, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp_nanos.to_be_bytes());
    hasher.update(nonce.to_be_bytes());

    let mut key = URL_SAFE_NO_PAD.encode(hasher.finalize());
    key.truncate(len);
    key
}

/// Returns true if `key` is a reserved route word (ASCII case-insensitive).
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.iter().any(|r| r.eq_ignore_ascii_case(key))
}

/// Validates a caller-supplied short key.
///
/// # Rules
///
/// - Length: 1-16 characters
/// - Printable ASCII only, no whitespace
/// - No `/`, `?`, `#`, `%` or `\`
/// - Not a dot segment (`.` or `..`), which clients drop from paths
/// - Not a reserved route word
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() || key.len() > MAX_CUSTOM_KEY_LENGTH {
        return Err(AppError::bad_request(
            "Custom key must be 1-16 characters",
            json!({ "provided_length": key.len() }),
        ));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_graphic() && !FORBIDDEN_KEY_CHARS.contains(&c))
    {
        return Err(AppError::bad_request(
            "Custom key may only contain printable characters other than / ? # % \\",
            json!({ "slug": key }),
        ));
    }

    if key == "." || key == ".." {
        return Err(AppError::bad_request(
            "Custom key cannot be a dot segment",
            json!({ "slug": key }),
        ));
    }

    if is_reserved(key) {
        return Err(AppError::bad_request(
            "This key is reserved",
            json!({ "slug": key }),
        ));
    }

    Ok(())
}

/// Candidate generator bound to a key length.
#[derive(Debug, Clone, Copy)]
pub struct KeyCodec {
    length: usize,
}

impl KeyCodec {
    /// Creates a codec; `length` is clamped to `6..=16`.
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_KEY_LENGTH, MAX_KEY_LENGTH),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Produces a fresh candidate from the current time and a random nonce.
    pub fn generate(&self) -> String {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        encode(nanos, rand::random::<u64>(), self.length)
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(encode(1_700_000_000, 42, 8), encode(1_700_000_000, 42, 8));
    }

    #[test]
    fn test_encode_depends_on_nonce_and_time() {
        let base = encode(1_700_000_000, 42, 8);
        assert_ne!(base, encode(1_700_000_000, 43, 8));
        assert_ne!(base, encode(1_700_000_001, 42, 8));
    }

    #[test]
    fn test_encode_respects_length() {
        for len in [1, 6, 8, 16] {
            assert_eq!(encode(0, 0, len).len(), len);
        }
        assert_eq!(encode(0, 0, 100).len(), 43);
    }

    #[test]
    fn test_encode_url_safe_alphabet() {
        for nonce in 0..200 {
            let key = encode(1, nonce, 16);
            assert!(
                key.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn test_codec_clamps_length() {
        assert_eq!(KeyCodec::new(2).length(), MIN_KEY_LENGTH);
        assert_eq!(KeyCodec::new(64).length(), MAX_KEY_LENGTH);
        assert_eq!(KeyCodec::default().length(), 8);
    }

    #[test]
    fn test_generate_produces_unique_keys() {
        let codec = KeyCodec::default();
        let keys: HashSet<String> = (0..1000).map(|_| codec.generate()).collect();

        assert_eq!(keys.len(), 1000);
        assert!(keys.iter().all(|k| k.len() == 8));
    }

    #[test]
    fn test_validate_accepts_printable_keys() {
        assert!(validate_custom_key("promo").is_ok());
        assert!(validate_custom_key("A").is_ok());
        assert!(validate_custom_key("Sale_2025-Q1!").is_ok());
        assert!(validate_custom_key("abcdefghijklmnop").is_ok());
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_custom_key("").is_err());

        let err = validate_custom_key("abcdefghijklmnopq").unwrap_err();
        assert!(err.to_string().contains("1-16"));
    }

    #[test]
    fn test_validate_rejects_path_breaking_chars() {
        for key in ["a/b", "a?b", "a#b", "100%", "a\\b", "a b", "ключ"] {
            assert!(validate_custom_key(key).is_err(), "'{}' should be invalid", key);
        }
    }

    #[test]
    fn test_validate_rejects_dot_segments() {
        assert!(validate_custom_key(".").is_err());
        assert!(validate_custom_key("..").is_err());
        assert!(validate_custom_key("...").is_ok());
        assert!(validate_custom_key(".well").is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_words() {
        for &reserved in RESERVED_KEYS {
            assert!(validate_custom_key(reserved).is_err());
        }
        assert!(validate_custom_key("Health").is_err());
    }
}
