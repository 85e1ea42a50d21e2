//! Command-line parsing for the `agri` price fetcher.
//!
//! Argument parsing and dispatch live here and in `app`; the fetch pipeline
//! itself never sees clap types.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::{agmarknet, datagov};
use crate::domain::DEFAULT_PAGE_SIZE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "agri", version, about = "Daily agricultural commodity prices from Indian open-data APIs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch mandi prices from the Agmarknet API (CEDA mirror).
    Agmarknet(AgmarknetArgs),
    /// Fetch prices from a data.gov.in resource.
    Datagov(DataGovArgs),
    /// Print the summary of a previously saved series (CSV or JSON).
    Show(ShowArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct AgmarknetArgs {
    /// Commodity name (substring, case-insensitive).
    #[arg(long, default_value = agmarknet::DEFAULT_COMMODITY)]
    pub commodity: String,

    /// Variety keywords, comma separated; a row matching any of them is kept.
    #[arg(long, value_delimiter = ',')]
    pub variety: Vec<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub market: Option<String>,

    /// API base URL (overrides AGMARKNET_BASE_URL).
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Candidate endpoint path; repeat to try several in order (overrides AGMARKNET_PATHS).
    #[arg(long = "path")]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct DataGovArgs {
    /// Resource UUID, `resource/<id>`, or the full resource URL.
    #[arg(long = "resource-id")]
    pub resource_id: String,

    /// Commodity name (substring, case-insensitive).
    #[arg(long, default_value = datagov::DEFAULT_COMMODITY)]
    pub commodity: String,

    #[arg(long)]
    pub state: Option<String>,

    /// Reporting centre (matched against the market column).
    #[arg(long)]
    pub centre: Option<String>,

    #[command(flatten)]
    pub fetch: FetchArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by both sources.
#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// First date to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Rows requested per page.
    #[arg(long = "page-size", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Ask the upstream for a CSV export instead of JSON.
    #[arg(long)]
    pub csv: bool,

    /// Request timeout in seconds (source default if omitted).
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Write the series as a `Date,Price` CSV.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Append today's date to the output file names.
    #[arg(long = "date-suffix")]
    pub date_suffix: bool,

    /// Also write the series as JSON records.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Number of most recent days to print.
    #[arg(long, default_value_t = 10)]
    pub tail: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Path to a `Date,Price` CSV, or a `.json` file written by `--json`.
    pub path: PathBuf,

    /// Number of most recent days to print.
    #[arg(long, default_value_t = 10)]
    pub tail: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agmarknet_defaults_and_lists() {
        let cli = Cli::parse_from([
            "agri",
            "agmarknet",
            "--variety",
            "Basmati,1121",
            "--path",
            "/a",
            "--path",
            "/b",
            "--from",
            "2024-01-01",
        ]);
        let Command::Agmarknet(args) = cli.command else {
            panic!("expected agmarknet");
        };
        assert_eq!(args.commodity, "Paddy");
        assert_eq!(args.variety, vec!["Basmati", "1121"]);
        assert_eq!(args.paths, vec!["/a", "/b"]);
        assert_eq!(args.fetch.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.fetch.page_size, 1000);
        assert_eq!(args.output.tail, 10);
    }

    #[test]
    fn datagov_requires_resource_id() {
        assert!(Cli::try_parse_from(["agri", "datagov"]).is_err());
        let cli = Cli::try_parse_from(["agri", "datagov", "--resource-id", "abc", "--csv"]).unwrap();
        let Command::Datagov(args) = cli.command else {
            panic!("expected datagov");
        };
        assert_eq!(args.commodity, "Rice");
        assert!(args.fetch.csv);
    }

    #[test]
    fn show_takes_a_path() {
        let cli = Cli::parse_from(["agri", "show", "out/prices.json", "--tail", "3"]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.path, PathBuf::from("out/prices.json"));
        assert_eq!(args.tail, 3);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["agri", "agmarknet", "--to", "31/01/2024"]).is_err());
    }
}
