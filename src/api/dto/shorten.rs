//! DTOs for the URL shortening endpoint.

use serde::Deserialize;
use validator::Validate;

/// Longest accepted time-to-live: ten years.
pub const MAX_TTL_SECONDS: u64 = 315_360_000;

/// Query parameters of `POST /shorten`.
///
/// `url` stays optional here so that a missing parameter is reported with the
/// same error body as an empty one.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenParams {
    pub url: Option<String>,

    #[validate(length(max = 16))]
    pub slug: Option<String>,

    #[validate(range(min = 1, max = MAX_TTL_SECONDS))]
    pub ttl_seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_bounds() {
        let params = ShortenParams {
            url: Some("https://example.com".into()),
            slug: None,
            ttl_seconds: Some(0),
        };
        assert!(params.validate().is_err());

        let params = ShortenParams {
            url: Some("https://example.com".into()),
            slug: None,
            ttl_seconds: Some(MAX_TTL_SECONDS),
        };
        assert!(params.validate().is_ok());

        let params = ShortenParams {
            url: Some("https://example.com".into()),
            slug: None,
            ttl_seconds: Some(MAX_TTL_SECONDS + 1),
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_slug_too_long() {
        let params = ShortenParams {
            url: Some("https://example.com".into()),
            slug: Some("a".repeat(17)),
            ttl_seconds: None,
        };
        assert!(params.validate().is_err());
    }
}
