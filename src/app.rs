//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs a source fetch (or loads a saved series)
//! - prints the summary
//! - writes optional CSV/JSON outputs

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use crate::cli::{Command, OutputArgs, ShowArgs};
use crate::domain::DailySeries;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `agri` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Agmarknet(args) => {
            let run = pipeline::run_agmarknet(&args)?;
            emit(&run, &args.output)
        }
        Command::Datagov(args) => {
            let run = pipeline::run_datagov(&args)?;
            emit(&run, &args.output)
        }
        Command::Show(args) => handle_show(args),
    }
}

/// Logs go to stderr so stdout stays clean for the summary.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit(run: &pipeline::RunOutput, output: &OutputArgs) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_series_summary(&run.title, &run.series, output.tail)
    );
    write_outputs(&run.series, output)
}

fn write_outputs(series: &DailySeries, output: &OutputArgs) -> Result<(), AppError> {
    let today = chrono::Local::now().date_naive();
    let resolve = |path: &Path| -> PathBuf {
        if output.date_suffix {
            crate::io::with_date_suffix(path, today)
        } else {
            path.to_path_buf()
        }
    };

    if let Some(path) = &output.out {
        let path = resolve(path);
        crate::io::write_series_csv(&path, series)?;
        info!(path = %path.display(), days = series.len(), "wrote series CSV");
        println!("Saved {}", path.display());
    }
    if let Some(path) = &output.json {
        let path = resolve(path);
        crate::io::write_series_json(&path, series)?;
        info!(path = %path.display(), days = series.len(), "wrote series JSON");
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let series = crate::io::read_series(&args.path)?;
    let title = args.path.display().to_string();
    println!("{}", crate::report::format_series_summary(&title, &series, args.tail));
    Ok(())
}
