use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::cloudstack::CloudStackConfig;
use crate::infrastructure::observability::ObservabilityConfig;

/// Conventional variable names mapped onto their configuration keys
const LEGACY_ENV: [(&str, &str); 4] = [
    ("CLOUDSTACK_API_URL", "cloudstack.api_url"),
    ("CLOUDSTACK_ACCESS_KEY", "cloudstack.api_key"),
    ("CLOUDSTACK_SECRET_KEY", "cloudstack.secret_key"),
    ("REDIS_URL", "cache.redis_url"),
];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub cloudstack: CloudStackConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `config/default`, `config/local`, `APP_*`
    /// variables, and the conventional CloudStack variables, in that order
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// `env` replaces the process environment when given
    fn build(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| match &env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            );

        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(key, lookup(var))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Checks settings that deserialization alone cannot
    pub fn validate(&self) -> Result<(), DomainError> {
        self.cloudstack.validate()?;

        if self.cache.ttl_secs == 0 {
            return Err(DomainError::configuration(
                "cache.ttl_secs must be greater than zero",
            ));
        }

        if self.cache.redis_timeout_ms == 0 {
            return Err(DomainError::configuration(
                "cache.redis_timeout_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::CacheType;
    use secrecy::ExposeSecret;

    fn env(vars: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_legacy_variables() {
        let config = AppConfig::build(env(&[
            ("CLOUDSTACK_API_URL", "https://cloud.example.com/client/api"),
            ("CLOUDSTACK_ACCESS_KEY", "access"),
            ("CLOUDSTACK_SECRET_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.cloudstack.api_url, "https://cloud.example.com/client/api");
        assert_eq!(config.cloudstack.api_key, "access");
        assert_eq!(config.cloudstack.secret_key.expose_secret(), "secret");
        assert_eq!(config.cloudstack.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::build(env(&[
            ("CLOUDSTACK_API_URL", "https://cloud.example.com/client/api"),
            ("CLOUDSTACK_ACCESS_KEY", "access"),
            ("CLOUDSTACK_SECRET_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.cache.backend, CacheType::InMemory);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.cache.redis_timeout_ms, 2000);
        assert!(config.observability.metrics.enabled);
    }

    #[test]
    fn test_prefixed_variables() {
        let config = AppConfig::build(env(&[
            ("APP_SERVER__PORT", "8081"),
            ("APP_LOGGING__FORMAT", "json"),
            ("APP_CLOUDSTACK__API_URL", "https://cloud.example.com/client/api"),
            ("APP_CLOUDSTACK__API_KEY", "access"),
            ("APP_CLOUDSTACK__SECRET_KEY", "secret"),
            ("APP_CLOUDSTACK__TIMEOUT_SECS", "30"),
            ("APP_CACHE__BACKEND", "redis"),
            ("APP_CACHE__REDIS_TIMEOUT_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.cloudstack.timeout_secs, 30);
        assert_eq!(config.cache.backend, CacheType::Redis);
        assert_eq!(config.cache.redis_timeout_ms, 500);
    }

    #[test]
    fn test_zero_redis_timeout_fails_validation() {
        let config = AppConfig::build(env(&[
            ("CLOUDSTACK_API_URL", "https://cloud.example.com/client/api"),
            ("CLOUDSTACK_ACCESS_KEY", "access"),
            ("CLOUDSTACK_SECRET_KEY", "secret"),
            ("APP_CACHE__REDIS_TIMEOUT_MS", "0"),
        ]))
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("redis_timeout_ms"));
    }

    #[test]
    fn test_legacy_redis_url_overrides_prefixed() {
        let config = AppConfig::build(env(&[
            ("APP_CLOUDSTACK__API_URL", "https://cloud.example.com/client/api"),
            ("APP_CLOUDSTACK__API_KEY", "access"),
            ("APP_CLOUDSTACK__SECRET_KEY", "secret"),
            ("APP_CACHE__REDIS_URL", "redis://prefixed:6379"),
            ("REDIS_URL", "redis://legacy:6379"),
        ]))
        .unwrap();

        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://legacy:6379"));
    }

    #[test]
    fn test_missing_cloudstack_section_fails() {
        assert!(AppConfig::build(env(&[("APP_SERVER__PORT", "8081")])).is_err());
    }

    #[test]
    fn test_blank_secret_fails_validation() {
        let config = AppConfig::build(env(&[
            ("CLOUDSTACK_API_URL", "https://cloud.example.com/client/api"),
            ("CLOUDSTACK_ACCESS_KEY", "access"),
            ("CLOUDSTACK_SECRET_KEY", ""),
        ]))
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
        assert!(err.to_string().contains("secret_key"));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = AppConfig::build(env(&[
            ("CLOUDSTACK_API_URL", "https://cloud.example.com/client/api"),
            ("CLOUDSTACK_ACCESS_KEY", "access-key-value"),
            ("CLOUDSTACK_SECRET_KEY", "secret-key-value"),
        ]))
        .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("access-key-value"));
        assert!(!debug.contains("secret-key-value"));
    }
}
