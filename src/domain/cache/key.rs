//! Cache key and lifetime for aggregated usage reports

use std::fmt;
use std::time::Duration;

use crate::domain::usage::UsageQuery;

/// How long an aggregated report stays valid in the cache
pub const USAGE_REPORT_TTL: Duration = Duration::from_secs(3600);

const USAGE_KEY_PREFIX: &str = "usage";

/// Deterministic cache key for one usage query
///
/// Shape: `usage_<domain>_<start>_<end>_<type1,type2,...>` with the selected
/// type names sorted, so the selection order never changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageCacheKey(String);

impl UsageCacheKey {
    pub fn for_query(query: &UsageQuery) -> Self {
        // BTreeSet iteration is already sorted.
        let usage_types = query
            .usage_types
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        Self(format!(
            "{}_{}_{}_{}_{}",
            USAGE_KEY_PREFIX, query.domain_id, query.start_date, query.end_date, usage_types
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UsageCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
