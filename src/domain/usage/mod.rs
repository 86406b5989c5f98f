//! Usage domain - CloudStack usage records and their aggregation

mod aggregator;
mod client;
mod query;
mod record;
mod types;

pub use aggregator::aggregate;
pub use client::UsageClient;
pub use query::{DATE_FORMAT, UsageQuery, UsageQueryForm};
pub use record::{AggregatedRecord, NOT_AVAILABLE, UsageRecord};
pub use types::{USAGE_TYPE_MAP, UsageType, usage_type_name};

#[cfg(test)]
pub use client::mock::MockUsageClient;
