//! Per-key visit analytics.

/// Visit count and distinct visitor fingerprints for one short key.
///
/// Created lazily on the first visit. A key that was never visited reads as
/// `count == 0` with no visitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickStats {
    pub short_key: String,
    pub count: u64,
    /// Sorted, deduplicated visitor identifiers.
    pub visitor_ids: Vec<String>,
}

impl ClickStats {
    /// Builds stats from raw store values, sorting visitor ids for stable output.
    pub fn new(short_key: impl Into<String>, count: u64, mut visitor_ids: Vec<String>) -> Self {
        visitor_ids.sort_unstable();
        visitor_ids.dedup();
        Self {
            short_key: short_key.into(),
            count,
            visitor_ids,
        }
    }

    /// Number of distinct visitors.
    pub fn unique_visitors(&self) -> usize {
        self.visitor_ids.len()
    }
}
