//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod usage;

pub use cache::{Cache, CacheExt, USAGE_REPORT_TTL, UsageCacheKey};
pub use error::DomainError;
pub use usage::{
    AggregatedRecord, USAGE_TYPE_MAP, UsageClient, UsageQuery, UsageQueryForm, UsageRecord,
    UsageType, aggregate, usage_type_name,
};
