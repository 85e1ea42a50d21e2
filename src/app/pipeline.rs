//! Shared fetch logic for the source subcommands.
//!
//! CLI flags are layered over the environment-derived config here, so the
//! adapters only ever see a finished config and a `Query`.

use std::time::Duration;

use crate::cli::{AgmarknetArgs, DataGovArgs, FetchArgs};
use crate::data::{AgmarknetClient, AgmarknetConfig, DataGovClient, DataGovConfig};
use crate::domain::{DailySeries, Query};
use crate::error::AppError;

/// Outputs of a single fetch run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Heading for the terminal summary.
    pub title: String,
    pub series: DailySeries,
}

pub fn run_agmarknet(args: &AgmarknetArgs) -> Result<RunOutput, AppError> {
    let config = agmarknet_config(args, AgmarknetConfig::from_env());
    let query = agmarknet_query(args);
    let client = AgmarknetClient::new(config)?;
    let series = client.fetch_daily(&query)?;

    Ok(RunOutput {
        title: format!("Agmarknet | {}", describe(&query)),
        series,
    })
}

pub fn run_datagov(args: &DataGovArgs) -> Result<RunOutput, AppError> {
    let mut config = DataGovConfig::from_env(&args.resource_id)?;
    if let Some(secs) = args.fetch.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    let query = datagov_query(args);
    let title = format!("data.gov.in {} | {}", config.resource_id, describe(&query));
    let client = DataGovClient::new(config)?;
    let series = client.fetch_daily(&query)?;

    Ok(RunOutput { title, series })
}

/// Flags win over the environment.
pub fn agmarknet_config(args: &AgmarknetArgs, mut config: AgmarknetConfig) -> AgmarknetConfig {
    if let Some(base) = &args.base_url {
        config.base_url = base.clone();
    }
    if !args.paths.is_empty() {
        config.paths = args.paths.clone();
    }
    if let Some(secs) = args.fetch.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config
}

pub fn agmarknet_query(args: &AgmarknetArgs) -> Query {
    Query {
        commodity: Some(args.commodity.clone()),
        variety_keywords: args.variety.clone(),
        state: args.state.clone(),
        market: args.market.clone(),
        ..base_query(&args.fetch)
    }
}

pub fn datagov_query(args: &DataGovArgs) -> Query {
    Query {
        commodity: Some(args.commodity.clone()),
        state: args.state.clone(),
        market: args.centre.clone(),
        ..base_query(&args.fetch)
    }
}

fn base_query(fetch: &FetchArgs) -> Query {
    Query {
        date_from: fetch.from,
        date_to: fetch.to,
        page_size: fetch.page_size,
        prefer_delimited: fetch.csv,
        ..Query::default()
    }
}

fn describe(query: &Query) -> String {
    let mut parts = Vec::new();
    if let Some(c) = &query.commodity {
        parts.push(c.clone());
    }
    if !query.variety_keywords.is_empty() {
        parts.push(format!("variety~{}", query.variety_keywords.join("|")));
    }
    if let Some(s) = &query.state {
        parts.push(s.clone());
    }
    if let Some(m) = &query.market {
        parts.push(m.clone());
    }
    if parts.is_empty() {
        parts.push("all".to_string());
    }
    parts.join(" / ")
}
