//! reqwest-backed CloudStack usage client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::CloudStackConfig;
use super::signer;
use crate::domain::{DomainError, UsageClient, UsageRecord};
use crate::infrastructure::observability::record_cloudstack_request;

const LIST_USAGE_RECORDS: &str = "listUsageRecords";

#[derive(Debug, Deserialize)]
struct ListUsageRecordsEnvelope {
    listusagerecordsresponse: Option<ListUsageRecordsResponse>,
}

#[derive(Debug, Deserialize)]
struct ListUsageRecordsResponse {
    count: Option<u64>,
    usagerecord: Option<Vec<UsageRecord>>,
}

/// Signed HTTP client for the CloudStack `listUsageRecords` command
///
/// The request URL carries the API key and signature, so it is never logged
/// and is stripped from transport errors before they leave this type.
#[derive(Debug, Clone)]
pub struct CloudStackClient {
    http: reqwest::Client,
    config: CloudStackConfig,
}

impl CloudStackClient {
    /// Creates a client using the configured request timeout
    pub fn new(config: CloudStackConfig) -> Result<Self, DomainError> {
        let timeout = config.timeout();
        Self::with_timeout(config, timeout)
    }

    pub fn with_timeout(config: CloudStackConfig, timeout: Duration) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { http, config })
    }

    fn signed_params(
        &self,
        domain_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("command", LIST_USAGE_RECORDS.to_string()),
            ("domainid", domain_id.to_string()),
            ("startdate", start_date.to_string()),
            ("enddate", end_date.to_string()),
            ("apiKey", self.config.api_key.clone()),
            ("response", "json".to_string()),
        ];

        let signature = signer::sign(
            params.iter().map(|(key, value)| (*key, value.as_str())),
            self.config.secret_key.expose_secret(),
        );
        params.push(("signature", signature));

        params
    }
}

fn transport_error(error: reqwest::Error) -> DomainError {
    let error = error.without_url();

    if error.is_timeout() {
        DomainError::upstream("Request timed out")
    } else if error.is_connect() {
        DomainError::upstream("Connection failed")
    } else {
        DomainError::upstream(format!("Request failed: {}", error))
    }
}

/// Pulls `errortext` out of a CloudStack error envelope such as
/// `{"listusagerecordsresponse":{"errorcode":401,"errortext":"..."}}`
fn error_text(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    value
        .as_object()?
        .values()
        .find_map(|inner| inner.get("errortext")?.as_str().map(str::to_string))
}

#[async_trait]
impl UsageClient for CloudStackClient {
    async fn list_usage_records(
        &self,
        domain_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Option<Vec<UsageRecord>>, DomainError> {
        let params = self.signed_params(domain_id, start_date, end_date);
        let started = Instant::now();

        debug!(
            command = LIST_USAGE_RECORDS,
            domain_id, start_date, end_date, "Calling CloudStack"
        );

        let response = match self.http.get(&self.config.api_url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                record_cloudstack_request("transport_error", started.elapsed());
                return Err(transport_error(e));
            }
        };

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            record_cloudstack_request("http_error", started.elapsed());
            warn!(status = %status, "CloudStack returned an error status");

            let message = match error_text(&body) {
                Some(text) => format!("HTTP {}: {}", status, text),
                None => format!("HTTP {}", status),
            };
            return Err(DomainError::upstream(message));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                record_cloudstack_request("transport_error", started.elapsed());
                return Err(transport_error(e));
            }
        };

        let envelope: ListUsageRecordsEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                record_cloudstack_request("malformed", started.elapsed());
                return Err(DomainError::malformed_upstream(format!(
                    "Failed to parse response: {}",
                    e
                )));
            }
        };

        record_cloudstack_request("success", started.elapsed());

        let Some(listing) = envelope.listusagerecordsresponse else {
            debug!(domain_id, "CloudStack response has no usage listing");
            return Ok(None);
        };

        let records = listing.usagerecord.unwrap_or_default();

        debug!(
            domain_id,
            records = records.len(),
            reported_count = listing.count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "CloudStack usage records received"
        );

        Ok(Some(records))
    }
}
