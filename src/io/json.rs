//! Read/write a daily series as JSON.
//!
//! The layout is an array of `{"Date": "YYYY-MM-DD", "Price": f64 | null}`
//! records, the shape dataframe libraries load with `orient="records"`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::DailySeries;
use crate::error::AppError;
use crate::io::export::ensure_parent_dir;

pub fn write_series_json(path: &Path, series: &DailySeries) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create series JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), series)
        .map_err(|e| AppError::new(2, format!("Failed to write series JSON: {e}")))?;
    Ok(())
}

/// Ordering is validated on load; an unsorted file is rejected.
pub fn read_series_json(path: &Path) -> Result<DailySeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open series JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid series JSON: {e}")))
}
