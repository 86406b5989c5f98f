//! Cache domain - expiring key-value abstraction

mod key;
mod repository;

pub use key::{USAGE_REPORT_TTL, UsageCacheKey};
pub use repository::{Cache, CacheExt};

#[cfg(test)]
pub use repository::mock::MockCache;
