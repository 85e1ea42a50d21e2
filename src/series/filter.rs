//! Row-inclusion filters applied after normalization.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{CanonicalField, CanonicalRow, Query};
use crate::schema::ResolvedSchema;

/// Case-insensitive substring filters derived from a `Query`.
///
/// Needles are stored lower-cased; blank needles are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    pub commodity: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    /// A row is kept if its variety contains *any* of these.
    pub variety_keywords: Vec<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn needle(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

impl RowFilter {
    pub fn from_query(query: &Query) -> Self {
        Self {
            commodity: needle(&query.commodity),
            state: needle(&query.state),
            market: needle(&query.market),
            variety_keywords: query
                .variety_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            date_from: query.date_from,
            date_to: query.date_to,
        }
    }

    /// Keep the rows that pass every active filter.
    ///
    /// A text filter whose field does not exist anywhere in `schema` is
    /// skipped (with a warning); where the field exists, a row without a value
    /// for it is dropped.
    pub fn apply(&self, rows: Vec<CanonicalRow>, schema: &ResolvedSchema) -> Vec<CanonicalRow> {
        let mut text_filters: Vec<(CanonicalField, Vec<&str>)> = Vec::new();
        let singles = [
            (CanonicalField::Commodity, &self.commodity),
            (CanonicalField::State, &self.state),
            (CanonicalField::Market, &self.market),
        ];
        for (field, value) in singles {
            if let Some(v) = value {
                text_filters.push((field, vec![v.as_str()]));
            }
        }
        if !self.variety_keywords.is_empty() {
            text_filters.push((
                CanonicalField::Variety,
                self.variety_keywords.iter().map(String::as_str).collect(),
            ));
        }

        text_filters.retain(|(field, _)| {
            let present = schema.has(*field);
            if !present {
                warn!(field = field.name(), "filter ignored: upstream schema has no such column");
            }
            present
        });

        rows.into_iter()
            .filter(|row| self.in_date_range(row))
            .filter(|row| {
                text_filters
                    .iter()
                    .all(|(field, needles)| matches_any(row.text(*field), needles))
            })
            .collect()
    }

    fn in_date_range(&self, row: &CanonicalRow) -> bool {
        let Some(date) = row.date else { return false };
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// `needles` must already be lower-case.
fn matches_any(value: Option<&str>, needles: &[&str]) -> bool {
    let Some(value) = value else { return false };
    let hay = value.to_lowercase();
    needles.iter().any(|n| hay.contains(n))
}
