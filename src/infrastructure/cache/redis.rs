//! Redis cache implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::DomainError;
use crate::domain::cache::Cache;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Upper bound on a single command round trip
    pub command_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(2),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Entries are written with `SET ... EX`, so expiry is enforced by Redis
/// itself. The connection manager reconnects on its own after an outage.
/// Every command is bounded by `command_timeout`; a server that accepts the
/// connection but never answers surfaces as a cache error.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("key_prefix", &self.config.key_prefix)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
                .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    async fn bounded<T, F>(&self, action: String, command: F) -> Result<T, DomainError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.command_timeout, command).await {
            Ok(result) => {
                result.map_err(|e| DomainError::cache(format!("Failed to {}: {}", action, e)))
            }
            Err(_) => Err(DomainError::cache(format!("Timed out trying to {}", action))),
        }
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.bounded(format!("get key '{}'", key), conn.get(&prefixed_key)).await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);

        self.bounded(
            format!("set key '{}'", key),
            conn.set_ex(&prefixed_key, value, ttl_secs),
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = self
            .bounded(format!("delete key '{}'", key), conn.del(&prefixed_key))
            .await?;

        Ok(deleted > 0)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs: i64 = self
            .bounded(format!("get TTL for key '{}'", key), conn.ttl(&prefixed_key))
            .await?;

        // Redis returns -2 if key doesn't exist, -1 if no TTL
        if ttl_secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(ttl_secs as u64)))
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: String = self
            .bounded("ping Redis".to_string(), redis::cmd("PING").query_async(&mut conn))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::domain::cache::CacheExt;
    use crate::domain::usage::{MockUsageClient, UsageQueryForm, UsageRecord};
    use crate::infrastructure::services::{UsageReport, UsageReportService};

    /// Replies `+OK` to connection set-up commands in a RESP chunk and
    /// nothing to anything else
    fn handshake_replies(chunk: &str) -> String {
        let lines: Vec<&str> = chunk.split("\r\n").collect();

        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with('*'))
            .filter_map(|(i, _)| lines.get(i + 2))
            .filter(|name| {
                matches!(
                    name.to_ascii_uppercase().as_str(),
                    "CLIENT" | "SELECT" | "AUTH"
                )
            })
            .map(|_| "+OK\r\n")
            .collect()
    }

    /// Starts a server that completes the connection handshake and then
    /// stops answering
    async fn spawn_stalled_redis() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    loop {
                        let n = match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        let replies = handshake_replies(&String::from_utf8_lossy(&buf[..n]));
                        if !replies.is_empty() && socket.write_all(replies.as_bytes()).await.is_err()
                        {
                            return;
                        }
                    }
                });
            }
        });

        format!("redis://{}", addr)
    }

    async fn stalled_cache() -> RedisCache {
        let config = RedisCacheConfig::new(spawn_stalled_redis().await)
            .with_connection_timeout(Duration::from_secs(2))
            .with_command_timeout(Duration::from_millis(200));

        RedisCache::new(config).await.unwrap()
    }

    // Note: These tests require a running Redis instance
    // Run with: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        // Cleanup
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let deleted = cache.delete("key1").await.unwrap();
        assert!(deleted);

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("ttl_key", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let ttl = cache.ttl("ttl_key").await.unwrap();
        assert!(ttl.is_some());
        assert!(ttl.unwrap().as_secs() > 50);

        assert!(cache.ping().await.is_ok());

        // Cleanup
        cache.delete("ttl_key").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_to_connect() {
        let config = RedisCacheConfig::new("redis://127.0.0.1:1")
            .with_connection_timeout(Duration::from_millis(500));

        let result = RedisCache::new(config).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[test]
    fn test_handshake_replies_only_answer_setup_commands() {
        let setup = "*4\r\n$6\r\nCLIENT\r\n$7\r\nSETINFO\r\n$8\r\nLIB-NAME\r\n$8\r\nredis-rs\r\n\
                     *4\r\n$6\r\nCLIENT\r\n$7\r\nSETINFO\r\n$7\r\nLIB-VER\r\n$6\r\n0.27.6\r\n";
        assert_eq!(handshake_replies(setup), "+OK\r\n+OK\r\n");

        let get = "*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n";
        assert_eq!(handshake_replies(get), "");
    }

    #[tokio::test]
    async fn test_stalled_redis_command_times_out() {
        let cache = stalled_cache().await;

        let result = tokio::time::timeout(Duration::from_secs(5), cache.get_raw("key1"))
            .await
            .expect("command should be bounded by the command timeout");

        match result {
            Err(DomainError::Cache { message }) => assert!(message.contains("Timed out")),
            other => panic!("expected a cache timeout, got {:?}", other),
        }

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            cache.set_raw("key1", "\"value\"", Duration::from_secs(60)),
        )
        .await
        .expect("command should be bounded by the command timeout");
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[tokio::test]
    async fn test_stalled_redis_falls_back_to_live_fetch() {
        let cache: Arc<dyn Cache> = Arc::new(stalled_cache().await);
        let client = Arc::new(MockUsageClient::new().with_records(vec![UsageRecord::new(
            "VM1",
            1,
            "2.5 Hrs",
            "2024-01-01",
            "2024-01-02",
        )]));
        let service = UsageReportService::new(client.clone(), cache);
        let form = UsageQueryForm {
            domain_id: "d-1".to_string(),
            startdate: "2024-01-01T00:00".to_string(),
            enddate: "2024-01-31T23:59".to_string(),
            usage_types: vec![],
        };

        let report = tokio::time::timeout(Duration::from_secs(5), service.report(&form))
            .await
            .expect("report should not wait on an unresponsive cache")
            .unwrap();

        assert!(matches!(report, UsageReport::Fresh(_)));
        assert_eq!(report.records()[0].usage, "2.50 Hrs");
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_key_prefix() {
        let config = RedisCacheConfig::new("redis://localhost").with_key_prefix("usage-viewer");
        assert_eq!(config.key_prefix, Some("usage-viewer".to_string()));
    }
}
