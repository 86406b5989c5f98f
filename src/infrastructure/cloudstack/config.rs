//! CloudStack connection settings

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::DomainError;

fn default_timeout_secs() -> u64 {
    10
}

/// CloudStack section of the application configuration
///
/// Every field is sensitive. `Debug` prints the API URL host only and masks
/// the credentials.
#[derive(Clone, Deserialize)]
pub struct CloudStackConfig {
    /// Full API endpoint, e.g. `https://cloud.example.com/client/api`
    pub api_url: String,
    pub api_key: String,
    pub secret_key: SecretString,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CloudStackConfig {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            secret_key: SecretString::new(secret_key.into()),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Rejects blank settings without naming their values
    pub fn validate(&self) -> Result<(), DomainError> {
        let missing: Vec<&str> = [
            ("api_url", self.api_url.trim().is_empty()),
            ("api_key", self.api_key.trim().is_empty()),
            ("secret_key", self.secret_key.expose_secret().trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, blank)| blank.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(DomainError::configuration(format!(
                "Missing CloudStack settings: {}",
                missing.join(", ")
            )));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(DomainError::configuration(
                "CloudStack api_url must be an http(s) URL",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(DomainError::configuration(
                "CloudStack timeout_secs must be greater than zero",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for CloudStackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudStackConfig")
            .field("api_url", &"[REDACTED]")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
