//! Validation of URLs submitted for shortening.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Longest URL accepted for shortening.
pub const MAX_URL_LENGTH: usize = 2048;

/// Reasons a submitted URL is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Missing URL parameter")]
    Missing,

    #[error("URL exceeds 2048 characters")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

impl From<UrlValidationError> for AppError {
    fn from(e: UrlValidationError) -> Self {
        AppError::bad_request(e.to_string(), json!({}))
    }
}

/// Checks that `input` is an absolute `http`/`https` URL with a host.
///
/// The URL is stored as submitted (surrounding whitespace trimmed); it is
/// parsed only to reject malformed input.
///
/// Rejects schemes such as `javascript:`, `data:` and `file:`.
///
/// # Errors
///
/// See [`UrlValidationError`].
pub fn validate_url(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Missing);
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            validate_url("https://example.com/a").unwrap(),
            "https://example.com/a"
        );
        assert_eq!(
            validate_url("http://example.com:8080/x?y=1#frag").unwrap(),
            "http://example.com:8080/x?y=1#frag"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            validate_url("  https://example.com  ").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_empty_is_missing() {
        assert_eq!(validate_url(""), Err(UrlValidationError::Missing));
        assert_eq!(validate_url("   "), Err(UrlValidationError::Missing));
    }

    #[test]
    fn test_rejects_relative_and_garbage() {
        assert!(matches!(
            validate_url("example.com/path"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        for input in [
            "javascript:alert(1)",
            "data:text/html,hi",
            "file:///etc/passwd",
            "ftp://example.com",
        ] {
            assert_eq!(
                validate_url(input),
                Err(UrlValidationError::UnsupportedProtocol),
                "{}",
                input
            );
        }
    }

    #[test]
    fn test_rejects_overlong() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(validate_url(&long), Err(UrlValidationError::TooLong));
    }

    #[test]
    fn test_maps_to_validation_error() {
        let err: AppError = UrlValidationError::Missing.into();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(err.to_string(), "Missing URL parameter");
    }
}
