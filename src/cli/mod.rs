//! CLI module for the CloudStack usage viewer
//!
//! - `serve`: web UI (default)
//! - `query`: one report printed as JSON

pub mod query;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// CloudStack Usage Viewer - aggregated usage reports per domain
#[derive(Debug, Parser)]
#[command(name = "cloudstack-usage-viewer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web UI (default)
    Serve,

    /// Run one usage query and print the aggregated records as JSON
    Query(query::QueryArgs),
}

/// Reads `.env`, loads configuration, and rejects incomplete settings
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;

    Ok(config)
}
