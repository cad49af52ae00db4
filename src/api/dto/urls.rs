//! DTOs for record management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::shorten::MAX_TTL_SECONDS;
use crate::domain::entities::{ClickStats, UrlRecord};

/// A record together with its click statistics.
#[derive(Debug, Serialize)]
pub struct UrlSummary {
    pub short_key: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub clicks: u64,
    pub unique_visitors: usize,
    pub visitor_ids: Vec<String>,
}

impl UrlSummary {
    pub fn new(record: UrlRecord, short_url: String, stats: ClickStats) -> Self {
        Self {
            short_key: record.short_key,
            short_url,
            original_url: record.original_url,
            created_at: record.created_at,
            expires_at: record.expires_at,
            clicks: stats.count,
            unique_visitors: stats.unique_visitors(),
            visitor_ids: stats.visitor_ids,
        }
    }
}

/// Response of `GET /urls`.
#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub total: usize,
    pub items: Vec<UrlSummary>,
}

/// Request body of `POST /urls/{key}/expire`.
#[derive(Debug, Deserialize, Validate)]
pub struct ExpireRequest {
    #[validate(range(min = 1, max = MAX_TTL_SECONDS))]
    pub ttl_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct ExpireResponse {
    pub short_key: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expire_ttl_bounds() {
        assert!(ExpireRequest { ttl_seconds: 0 }.validate().is_err());
        assert!(ExpireRequest { ttl_seconds: MAX_TTL_SECONDS }.validate().is_ok());
        assert!(
            ExpireRequest {
                ttl_seconds: MAX_TTL_SECONDS + 1
            }
            .validate()
            .is_err()
        );
    }
}
