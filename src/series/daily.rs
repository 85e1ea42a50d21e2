//! Reduce filtered rows to one mean price per calendar date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{CanonicalRow, DailySeries};

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    sum: f64,
    n: usize,
}

/// Group rows by date and average their prices (unweighted).
///
/// Rows without a date are ignored. A date whose rows carry no price at all
/// gets the no-value sentinel rather than being dropped, so a price-less
/// source still yields the two-column shape.
pub fn aggregate_daily(rows: &[CanonicalRow]) -> DailySeries {
    let mut groups: BTreeMap<NaiveDate, Acc> = BTreeMap::new();

    for row in rows {
        let Some(date) = row.date else { continue };
        let acc = groups.entry(date).or_default();
        if let Some(price) = row.price {
            acc.sum += price;
            acc.n += 1;
        }
    }

    groups
        .into_iter()
        .map(|(date, acc)| {
            let mean = if acc.n > 0 {
                Some(acc.sum / acc.n as f64)
            } else {
                None
            };
            (date, mean)
        })
        .collect::<BTreeMap<_, _>>()
        .into()
}
