//! Value parsing and the type-probing (heuristic) column scan.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::domain::{RawRow, RawTable};

/// Non-null values inspected per column when probing its type.
pub const SAMPLE_SIZE: usize = 50;

// ISO first; then the day-first forms Indian open-data portals use.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d.%m.%Y",
];

// Two-digit years (`05/01/24`), tried only once the four-digit forms fail.
const SHORT_YEAR_FORMATS: [&str; 5] = ["%d/%m/%y", "%d-%m-%y", "%d-%b-%y", "%d %b %y", "%d.%m.%y"];

/// `%Y` also accepts one- and two-digit years; anything before this is a misparse.
const MIN_YEAR: i32 = 1000;

/// Parse a date from text. Time-of-day, if present, is discarded.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let long = DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .find(|d| d.year() >= MIN_YEAR);
    if long.is_some() {
        return long;
    }
    for fmt in SHORT_YEAR_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // `YYYY-MM` month stamps map to the first of the month.
    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Some(d);
        }
    }

    // Date-times: keep the date part.
    if let Some((head, _)) = s.split_once(|c: char| c == 'T' || c == ' ') {
        if head.len() >= 8 && head != s {
            return parse_date_str(head);
        }
    }
    None
}

/// Numbers are never dates; only strings are parsed.
pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Parse a finite number from a JSON number or numeric text (`"1,234.50"` included).
pub fn parse_number_value(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Render a scalar as text for the categorical fields.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() { None } else { Some(t.to_string()) }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// First `SAMPLE_SIZE` non-blank values of `column`.
fn sample<'a>(rows: &'a [RawRow], column: &str) -> Vec<&'a Value> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !is_blank(v))
        .take(SAMPLE_SIZE)
        .collect()
}

/// First column (natural order, skipping `exclude`) whose sampled values all satisfy `accept`.
///
/// A column with no non-blank values is never chosen.
fn probe_column<F>(table: &RawTable, exclude: &[&str], accept: F) -> Option<String>
where
    F: Fn(&Value) -> bool,
{
    table
        .columns
        .iter()
        .filter(|c| !exclude.contains(&c.as_str()))
        .find(|c| {
            let values = sample(&table.rows, c);
            !values.is_empty() && values.iter().all(|v| accept(v))
        })
        .cloned()
}

pub fn probe_date_column(table: &RawTable, exclude: &[&str]) -> Option<String> {
    probe_column(table, exclude, |v| parse_date_value(v).is_some())
}

pub fn probe_numeric_column(table: &RawTable, exclude: &[&str]) -> Option<String> {
    probe_column(table, exclude, |v| parse_number_value(v).is_some())
}
