//! Usage record entities

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Placeholder used for missing descriptions and dates
pub const NOT_AVAILABLE: &str = "N/A";

const DEFAULT_USAGE: &str = "0 Hrs";

/// A usage line item as returned by CloudStack's `listUsageRecords`
///
/// Only the fields the report needs are kept; the rest of the upstream
/// object is ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_usage_type")]
    pub usagetype: i64,
    /// Raw usage string, e.g. `"2.5 Hrs"`
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub startdate: Option<String>,
    #[serde(default)]
    pub enddate: Option<String>,
}

impl UsageRecord {
    pub fn new(
        description: impl Into<String>,
        usagetype: i64,
        usage: impl Into<String>,
        startdate: impl Into<String>,
        enddate: impl Into<String>,
    ) -> Self {
        Self {
            description: Some(description.into()),
            usagetype,
            usage: Some(usage.into()),
            startdate: Some(startdate.into()),
            enddate: Some(enddate.into()),
        }
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn startdate_or_default(&self) -> &str {
        self.startdate.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn enddate_or_default(&self) -> &str {
        self.enddate.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Parses the leading numeric token of the usage string
    ///
    /// `NaN` and infinities are rejected like any other non-numeric token.
    pub fn hours(&self) -> Result<f64, DomainError> {
        let raw = self.usage.as_deref().unwrap_or(DEFAULT_USAGE);

        let token = raw.split_whitespace().next().ok_or_else(|| {
            DomainError::malformed_upstream(format!(
                "empty usage value for '{}'",
                self.description_or_default()
            ))
        })?;

        token
            .parse::<f64>()
            .ok()
            .filter(|hours| hours.is_finite())
            .ok_or_else(|| {
                DomainError::malformed_upstream(format!(
                    "usage value '{}' for '{}' is not numeric",
                    raw,
                    self.description_or_default()
                ))
            })
    }
}

/// Accepts the usage type as either a JSON number or a numeric string
fn deserialize_usage_type<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUsageType {
        Number(i64),
        Text(String),
    }

    match Option::<RawUsageType>::deserialize(deserializer)? {
        None => Ok(0),
        Some(RawUsageType::Number(code)) => Ok(code),
        Some(RawUsageType::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("usage type '{}' is not an integer", text))),
    }
}

/// Totals for one (description, usage type) pair within a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub description: String,
    /// Display name of the usage type, or the code when it is not mapped
    pub usagetype: String,
    /// Accumulated hours formatted as `"<hours> Hrs"` with two decimals
    pub usage: String,
    pub startdate: String,
    pub enddate: String,
}
