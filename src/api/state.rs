//! Application state shared by the HTTP handlers

use std::sync::Arc;

use crate::domain::Cache;
use crate::infrastructure::services::UsageReportService;

#[derive(Clone)]
pub struct AppState {
    pub report_service: Arc<UsageReportService>,
    /// Same store the report service uses; probed by `/ready`
    pub cache: Arc<dyn Cache>,
}

impl AppState {
    pub fn new(report_service: Arc<UsageReportService>, cache: Arc<dyn Cache>) -> Self {
        Self {
            report_service,
            cache,
        }
    }
}
