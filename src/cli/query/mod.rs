//! Query command - one usage report on stdout

use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::domain::{AggregatedRecord, UsageQueryForm};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::UsageReport;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// CloudStack domain ID
    #[arg(long)]
    pub domain_id: String,

    /// Start of the range, YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub start: String,

    /// End of the range, YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub end: String,

    /// Usage type name to include; repeat for several, omit for all
    #[arg(long = "usage-type", value_name = "NAME")]
    pub usage_types: Vec<String>,

    /// Drop the cached report before querying
    #[arg(long)]
    pub refresh: bool,
}

impl QueryArgs {
    fn to_form(&self) -> UsageQueryForm {
        UsageQueryForm {
            domain_id: self.domain_id.clone(),
            startdate: self.start.clone(),
            enddate: self.end.clone(),
            usage_types: self.usage_types.clone(),
        }
    }
}

/// Where the printed records came from
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Source {
    Cache,
    Cloudstack,
    #[serde(rename = "none")]
    NoData,
}

#[derive(Debug, Serialize)]
struct QueryOutput<'a> {
    source: Source,
    records: &'a [AggregatedRecord],
}

impl<'a> QueryOutput<'a> {
    fn from_report(report: &'a UsageReport) -> Self {
        let source = match report {
            UsageReport::NoData => Source::NoData,
            report if report.is_cached() => Source::Cache,
            _ => Source::Cloudstack,
        };

        Self {
            source,
            records: report.records(),
        }
    }
}

/// Run a single query and print the result as pretty JSON
pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_logging(&config.logging);

    let query = args.to_form().validate()?;
    let state = crate::create_app_state(&config).await?;

    if args.refresh {
        if let Err(e) = state.report_service.invalidate(&query).await {
            warn!(error = %e, "Failed to drop cached report, continuing");
        }
    }

    let report = state.report_service.run(&query).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&QueryOutput::from_report(&report))?
    );

    Ok(())
}
