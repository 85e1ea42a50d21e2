//! Write a daily series as a `Date,Price` CSV.
//!
//! The file is meant to be opened in a spreadsheet or picked up by the
//! forecasting scripts downstream, so the layout never changes: one header
//! line, ISO dates ascending, an empty `Price` cell for a day without a price.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::DailySeries;
use crate::error::AppError;

/// Write `series` to `path`, creating parent directories as needed.
pub fn write_series_csv(path: &Path, series: &DailySeries) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create series CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{}", DailySeries::COLUMNS.join(","))
        .map_err(|e| AppError::new(2, format!("Failed to write series CSV header: {e}")))?;

    for p in series.points() {
        // `{:?}` keeps the decimal point on whole numbers (`150.0`).
        let price = p.price.map(|v| format!("{v:?}")).unwrap_or_default();
        writeln!(out, "{},{}", p.date, price)
            .map_err(|e| AppError::new(2, format!("Failed to write series CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush series CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// `prices.csv` -> `prices_2024-01-31.csv`; a path without an extension
/// gets the suffix appended.
pub fn with_date_suffix(path: &Path, date: NaiveDate) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{date}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{date}"),
    };
    path.with_file_name(name)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}
