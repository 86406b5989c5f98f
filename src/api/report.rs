//! Usage report page

use std::collections::BTreeSet;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::Form;
use tracing::error;

use super::state::AppState;
use crate::domain::{AggregatedRecord, DomainError, USAGE_TYPE_MAP, UsageQueryForm};
use crate::infrastructure::services::UsageReport;

const NO_DATA_MESSAGE: &str = "No usage data found or error in API response";

/// One checkbox in the usage type filter
#[derive(Debug, Clone)]
pub struct UsageTypeOption {
    pub name: &'static str,
    pub selected: bool,
}

/// Flash-style message shown above the form
#[derive(Debug, Clone)]
pub struct Flash {
    /// CSS suffix: `error` or `info`
    pub level: &'static str,
    pub message: String,
}

impl Flash {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: "error",
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            level: "info",
            message: message.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub usage_types: Vec<UsageTypeOption>,
    pub domain_id: String,
    pub startdate: String,
    pub enddate: String,
    pub records: Vec<AggregatedRecord>,
    pub from_cache: bool,
    /// Whether to say so when a successful query produced no rows
    pub show_empty: bool,
    pub flash: Option<Flash>,
}

impl IndexTemplate {
    fn empty() -> Self {
        Self::for_form(&UsageQueryForm::default())
    }

    /// Page that echoes a submitted form back with its selections ticked
    fn for_form(form: &UsageQueryForm) -> Self {
        let selected: BTreeSet<&str> = form.usage_types.iter().map(|t| t.trim()).collect();

        Self {
            usage_types: USAGE_TYPE_MAP
                .iter()
                .map(|usage_type| UsageTypeOption {
                    name: usage_type.name,
                    selected: selected.contains(usage_type.name),
                })
                .collect(),
            domain_id: form.domain_id.clone(),
            startdate: form.startdate.clone(),
            enddate: form.enddate.clone(),
            records: Vec::new(),
            from_cache: false,
            show_empty: false,
            flash: None,
        }
    }
}

/// HTTP status for a failed report on the rendered page
fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::Validation { .. } => StatusCode::BAD_REQUEST,
        DomainError::Upstream { .. } | DomainError::MalformedUpstream { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn render(page: &IndexTemplate, status: StatusCode) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render usage page");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// `GET /` - the empty query form
pub async fn show_form() -> Response {
    render(&IndexTemplate::empty(), StatusCode::OK)
}

/// `POST /` - run the query and render the result on the same page
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<UsageQueryForm>,
) -> Response {
    let mut page = IndexTemplate::for_form(&form);

    let status = match state.report_service.report(&form).await {
        Ok(UsageReport::NoData) => {
            page.flash = Some(Flash::info(NO_DATA_MESSAGE));
            StatusCode::OK
        }
        Ok(report) => {
            page.from_cache = report.is_cached();
            page.records = report.records().to_vec();
            page.show_empty = true;
            StatusCode::OK
        }
        Err(e) => {
            page.flash = Some(Flash::error(e.user_message()));
            status_for(&e)
        }
    };

    render(&page, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&DomainError::validation("All fields are required!")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DomainError::upstream("HTTP 500")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DomainError::malformed_upstream("bad usage")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&DomainError::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_page_lists_every_usage_type() {
        let html = IndexTemplate::empty().render().unwrap();

        for usage_type in USAGE_TYPE_MAP.iter() {
            assert!(html.contains(&format!("value=\"{}\"", usage_type.name)));
        }
        assert!(!html.contains("checked"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_form_values_are_echoed_and_escaped() {
        let form = UsageQueryForm {
            domain_id: "<script>".to_string(),
            startdate: "2024-01-01T00:00".to_string(),
            enddate: "2024-01-31T23:59".to_string(),
            usage_types: vec!["Volume".to_string()],
        };

        let html = IndexTemplate::for_form(&form).render().unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("value=\"2024-01-01T00:00\""));
        assert!(html.contains("value=\"Volume\" checked"));
        assert!(!html.contains("value=\"CPU\" checked"));
    }

    #[test]
    fn test_records_and_cache_note_render() {
        let mut page = IndexTemplate::empty();
        page.records = vec![AggregatedRecord {
            description: "VM1".to_string(),
            usagetype: "Running VM".to_string(),
            usage: "4.00 Hrs".to_string(),
            startdate: "2024-01-01".to_string(),
            enddate: "2024-01-04".to_string(),
        }];
        page.from_cache = true;

        let html = page.render().unwrap();

        assert!(html.contains("<td class=\"usage\">4.00 Hrs</td>"));
        assert!(html.contains("Served from cache."));
    }

    #[test]
    fn test_flash_renders() {
        let mut page = IndexTemplate::empty();
        page.flash = Some(Flash::error("All fields are required!"));

        let html = page.render().unwrap();
        assert!(html.contains("flash-error"));
        assert!(html.contains("All fields are required!"));
    }
}
