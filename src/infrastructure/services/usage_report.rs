//! Usage report service - validation, caching, fetching and aggregation

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::cache::{Cache, CacheExt, USAGE_REPORT_TTL, UsageCacheKey};
use crate::domain::usage::{AggregatedRecord, UsageClient, UsageQuery, UsageQueryForm, aggregate};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_cache_lookup;

/// Outcome of a successful report request
#[derive(Debug, Clone, PartialEq)]
pub enum UsageReport {
    /// Served from the cache without calling CloudStack
    Cached(Vec<AggregatedRecord>),
    /// Fetched from CloudStack, aggregated, and stored
    Fresh(Vec<AggregatedRecord>),
    /// CloudStack answered without a usage listing; nothing was stored
    NoData,
}

impl UsageReport {
    pub fn records(&self) -> &[AggregatedRecord] {
        match self {
            UsageReport::Cached(records) | UsageReport::Fresh(records) => records,
            UsageReport::NoData => &[],
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, UsageReport::Cached(_))
    }
}

/// Orchestrates one usage query end to end
///
/// A cache outage never fails a request: lookups degrade to a miss and
/// failed writes are only logged.
#[derive(Debug, Clone)]
pub struct UsageReportService {
    client: Arc<dyn UsageClient>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl UsageReportService {
    pub fn new(client: Arc<dyn UsageClient>, cache: Arc<dyn Cache>) -> Self {
        Self {
            client,
            cache,
            ttl: USAGE_REPORT_TTL,
        }
    }

    /// Overrides how long aggregated reports stay cached
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validates a raw form submission and runs it
    pub async fn report(&self, form: &UsageQueryForm) -> Result<UsageReport, DomainError> {
        let query = form.validate()?;
        self.run(&query).await
    }

    /// Runs an already validated query
    pub async fn run(&self, query: &UsageQuery) -> Result<UsageReport, DomainError> {
        let key = UsageCacheKey::for_query(query);

        debug!(
            domain_id = %query.domain_id,
            start_date = %query.start_date,
            end_date = %query.end_date,
            usage_types = ?query.usage_types,
            "Usage report requested"
        );

        if let Some(records) = self.lookup(&key).await {
            return Ok(UsageReport::Cached(records));
        }

        let raw = match self
            .client
            .list_usage_records(&query.domain_id, &query.start_date, &query.end_date)
            .await
        {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(domain_id = %query.domain_id, "No usage listing in CloudStack response");
                return Ok(UsageReport::NoData);
            }
            Err(e) => {
                error!(domain_id = %query.domain_id, error = %e, "Usage fetch failed");
                return Err(e);
            }
        };

        let aggregated = aggregate(&raw, &query.usage_types).map_err(|e| {
            error!(domain_id = %query.domain_id, error = %e, "Usage aggregation failed");
            e
        })?;

        debug!(
            raw = raw.len(),
            aggregated = aggregated.len(),
            "Usage records aggregated"
        );

        self.store(&key, &aggregated).await;

        Ok(UsageReport::Fresh(aggregated))
    }

    /// Drops the cached report for a query
    pub async fn invalidate(&self, query: &UsageQuery) -> Result<bool, DomainError> {
        let key = UsageCacheKey::for_query(query);
        self.cache.delete(key.as_str()).await
    }

    async fn lookup(&self, key: &UsageCacheKey) -> Option<Vec<AggregatedRecord>> {
        let cached: Result<Option<Vec<AggregatedRecord>>, DomainError> =
            self.cache.get(key.as_str()).await;

        match cached {
            Ok(Some(records)) => {
                record_cache_lookup("hit");
                debug!(key = %key, records = records.len(), "Usage cache hit");
                Some(records)
            }
            Ok(None) => {
                record_cache_lookup("miss");
                debug!(key = %key, "Usage cache miss");
                None
            }
            Err(e) => {
                record_cache_lookup("error");
                warn!(key = %key, error = %e, "Cache lookup failed, fetching live data");
                None
            }
        }
    }

    async fn store(&self, key: &UsageCacheKey, records: &[AggregatedRecord]) {
        if let Err(e) = self.cache.set(key.as_str(), &records, self.ttl).await {
            warn!(key = %key, error = %e, "Failed to cache usage report");
        }
    }
}
