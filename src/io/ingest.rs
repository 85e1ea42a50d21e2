//! Load a previously saved series back into a `DailySeries`.
//!
//! Header names are matched case-insensitively (a UTF-8 BOM on the first
//! header is ignored) and extra columns are allowed. Unlike upstream ingest,
//! a saved file is expected to be clean: any bad row fails the whole load.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{DailyPoint, DailySeries};
use crate::error::AppError;
use crate::schema::probe::parse_date_str;

/// Load a saved series, picking the reader from the file extension
/// (`.json` for JSON records, anything else as `Date,Price` CSV).
pub fn read_series(path: &Path) -> Result<DailySeries, AppError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        crate::io::json::read_series_json(path)
    } else {
        read_series_csv(path)
    }
}

pub fn read_series_csv(path: &Path) -> Result<DailySeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open series CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = column(&header_map, "date", path)?;
    let price_idx = column(&header_map, "price", path)?;

    let mut points = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = parse_date_str(raw_date)
            .ok_or_else(|| AppError::new(2, format!("Line {line}: invalid date '{raw_date}'")))?;

        let raw_price = record.get(price_idx).unwrap_or_default();
        let price = if raw_price.is_empty() {
            None
        } else {
            let v = raw_price
                .parse::<f64>()
                .map_err(|e| AppError::new(2, format!("Line {line}: invalid price '{raw_price}': {e}")))?;
            Some(v)
        };

        points.push(DailyPoint { date, price });
    }

    DailySeries::from_points(points)
        .map_err(|e| AppError::new(2, format!("Invalid series in '{}': {e}", path.display())))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn column(header_map: &HashMap<String, usize>, name: &str, path: &Path) -> Result<usize, AppError> {
    header_map.get(name).copied().ok_or_else(|| {
        AppError::new(
            2,
            format!("Series CSV '{}' has no `{name}` column.", path.display()),
        )
    })
}
