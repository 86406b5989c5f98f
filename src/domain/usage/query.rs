//! Usage query form and validation

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::DomainError;

/// Format of the `startdate` / `enddate` form fields
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Raw form submission, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageQueryForm {
    #[serde(rename = "domainID", default)]
    pub domain_id: String,
    #[serde(default)]
    pub startdate: String,
    #[serde(default)]
    pub enddate: String,
    #[serde(rename = "usageTypes", default)]
    pub usage_types: Vec<String>,
}

/// A validated usage query with trimmed fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageQuery {
    pub domain_id: String,
    pub start_date: String,
    pub end_date: String,
    /// Selected usage type names, sorted and de-duplicated
    pub usage_types: BTreeSet<String>,
}

impl UsageQueryForm {
    pub fn validate(&self) -> Result<UsageQuery, DomainError> {
        let domain_id = self.domain_id.trim();
        let start_date = self.startdate.trim();
        let end_date = self.enddate.trim();

        if domain_id.is_empty() || start_date.is_empty() || end_date.is_empty() {
            return Err(DomainError::validation("All fields are required!"));
        }

        let start = parse_date("start", start_date)?;
        let end = parse_date("end", end_date)?;

        if start >= end {
            return Err(invalid_date("End date must be after start date"));
        }

        Ok(UsageQuery {
            domain_id: domain_id.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            usage_types: self
                .usage_types
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDateTime, DomainError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        invalid_date(&format!(
            "{} date '{}' does not match YYYY-MM-DDTHH:MM ({})",
            label, value, e
        ))
    })
}

fn invalid_date(reason: &str) -> DomainError {
    DomainError::validation(format!("Invalid date format or range: {}", reason))
}
