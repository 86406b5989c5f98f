//! CloudStack Usage Viewer
//!
//! A small web front-end over CloudStack's `listUsageRecords` API:
//! - Signed requests (HMAC-SHA1) against the CloudStack API
//! - Per-domain usage aggregated by description and usage type
//! - Aggregated reports cached in memory or in Redis

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use infrastructure::cache::CacheFactory;
use infrastructure::cloudstack::CloudStackClient;
use infrastructure::services::UsageReportService;
use tracing::info;

/// Builds the shared application state from configuration
///
/// An unreachable Redis falls back to the in-memory cache rather than
/// failing start-up.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = CacheFactory::new().create_or_fallback(&config.cache).await;
    let client = CloudStackClient::new(config.cloudstack.clone())?;

    let report_service =
        UsageReportService::new(Arc::new(client), cache.clone()).with_ttl(config.cache.ttl());

    info!(
        cache_backend = %config.cache.backend,
        cache_ttl_secs = config.cache.ttl_secs,
        cloudstack_timeout_secs = config.cloudstack.timeout_secs,
        "Application state initialized"
    );

    Ok(AppState::new(Arc::new(report_service), cache))
}
