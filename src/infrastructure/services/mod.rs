//! Infrastructure services

mod usage_report;

pub use usage_report::{UsageReport, UsageReportService};
