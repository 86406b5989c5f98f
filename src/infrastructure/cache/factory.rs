//! Cache factory for runtime selection

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::DomainError;
use crate::domain::cache::Cache;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache types
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub enum CacheType {
    /// In-memory cache using moka
    #[default]
    #[serde(rename = "in_memory", alias = "inmemory", alias = "memory")]
    InMemory,
    /// Redis cache
    #[serde(rename = "redis")]
    Redis,
}

impl std::fmt::Display for CacheType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheType::InMemory => write!(f, "in_memory"),
            CacheType::Redis => write!(f, "redis"),
        }
    }
}

/// Cache section of the application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Type of cache to create
    pub backend: CacheType,
    /// Redis URL (required for Redis type)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Lifetime of cached usage reports
    pub ttl_secs: u64,
    /// Bound on connecting to Redis and on each Redis command
    pub redis_timeout_ms: u64,
    /// Maximum capacity (for in-memory cache)
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheType::InMemory,
            redis_url: None,
            key_prefix: None,
            ttl_secs: 3600,
            redis_timeout_ms: 2000,
            max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    /// Creates a new cache factory
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache instance based on configuration
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        match config.backend {
            CacheType::InMemory => Ok(self.create_in_memory(config)),
            CacheType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for Redis cache type")
                })?;

                let mut redis_config = RedisCacheConfig::new(url)
                    .with_connection_timeout(config.redis_timeout())
                    .with_command_timeout(config.redis_timeout());

                if let Some(prefix) = &config.key_prefix {
                    redis_config = redis_config.with_key_prefix(prefix.clone());
                }

                let cache = RedisCache::new(redis_config).await?;
                Ok(Arc::new(cache))
            }
        }
    }

    /// Creates the configured cache, falling back to in-memory when Redis
    /// cannot be reached at start-up
    pub async fn create_or_fallback(&self, config: &CacheConfig) -> Arc<dyn Cache> {
        match self.create(config).await {
            Ok(cache) => {
                info!(backend = %config.backend, "Cache initialized");
                cache
            }
            Err(e) => {
                warn!(
                    backend = %config.backend,
                    error = %e,
                    "Cache backend unavailable, using in-memory cache"
                );
                self.create_in_memory(config)
            }
        }
    }

    fn create_in_memory(&self, config: &CacheConfig) -> Arc<dyn Cache> {
        let in_memory_config = InMemoryCacheConfig::default()
            .with_default_ttl(config.ttl())
            .with_max_capacity(config.max_capacity);

        Arc::new(InMemoryCache::with_config(in_memory_config))
    }
}
