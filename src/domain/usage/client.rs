//! Outbound usage listing seam

use std::fmt::Debug;

use async_trait::async_trait;

use super::record::UsageRecord;
use crate::domain::DomainError;

/// Lists raw usage records for a domain over a date range
#[async_trait]
pub trait UsageClient: Send + Sync + Debug {
    /// Returns `Ok(None)` when the response carries no listing object at all,
    /// and `Ok(Some(vec![]))` when the listing is present but empty.
    async fn list_usage_records(
        &self,
        domain_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Option<Vec<UsageRecord>>, DomainError>;
}
