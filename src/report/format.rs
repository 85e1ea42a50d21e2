//! Formatted terminal output.
//!
//! Kept apart from the fetch pipeline so output changes stay local.

use std::fmt::Write;

use crate::domain::DailySeries;

/// Basic statistics over the priced days of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub priced_days: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// `None` when no day carries a price.
pub fn price_stats(series: &DailySeries) -> Option<PriceStats> {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in series.priced() {
        n += 1;
        sum += p;
        min = min.min(p);
        max = max.max(p);
    }
    if n == 0 {
        return None;
    }
    Some(PriceStats {
        priced_days: n,
        min,
        max,
        mean: sum / n as f64,
    })
}

/// Summary block: title, day count, date span, price stats, last `tail` rows.
pub fn format_series_summary(title: &str, series: &DailySeries, tail: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== {title} ===");
    if series.is_empty() {
        out.push_str("No rows matched; the series is empty.\n");
        return out;
    }

    let (first, last) = match (series.first_date(), series.last_date()) {
        (Some(a), Some(b)) => (a, b),
        _ => return out,
    };
    let _ = writeln!(out, "Days: {} | {first} .. {last}", series.len());

    match price_stats(series) {
        Some(s) => {
            let _ = writeln!(
                out,
                "Price: n={} | min={:.2} | max={:.2} | mean={:.2}",
                s.priced_days, s.min, s.max, s.mean
            );
        }
        None => out.push_str("Price: no price column upstream\n"),
    }

    if tail > 0 {
        let points = series.points();
        let start = points.len().saturating_sub(tail);
        let _ = writeln!(out, "\n{:<12} {:>12}", "Date", "Price");
        for p in &points[start..] {
            let price = p.price.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "{:<12} {:>12}", p.date.to_string(), price);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::DailyPoint;

    fn series() -> DailySeries {
        DailySeries::from_points(
            (1..=4)
                .map(|d| DailyPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    price: if d == 3 { None } else { Some(100.0 * d as f64) },
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn stats_skip_sentinel_days() {
        let s = price_stats(&series()).unwrap();
        assert_eq!(s.priced_days, 3);
        assert_eq!(s.min, 100.0);
        assert_eq!(s.max, 400.0);
        assert!((s.mean - 700.0 / 3.0).abs() < 1e-9);
        assert_eq!(price_stats(&DailySeries::empty()), None);
    }

    #[test]
    fn summary_shows_span_and_tail() {
        let text = format_series_summary("Paddy", &series(), 2);
        assert!(text.starts_with("=== Paddy ===\n"));
        assert!(text.contains("Days: 4 | 2024-01-01 .. 2024-01-04"));
        assert!(text.contains("2024-01-03              -"));
        assert!(text.contains("2024-01-04         400.00"));
        assert!(!text.contains("2024-01-02         200.00"));
    }

    #[test]
    fn empty_series_summary() {
        let text = format_series_summary("Rice", &DailySeries::empty(), 5);
        assert!(text.contains("empty"));
    }
}
