//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the fetch, normalize and aggregate stages
//! - exported to CSV/JSON
//! - reloaded later by the forecasting side

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One upstream record: lower-cased field name -> scalar value.
///
/// Field order is preserved (serde_json `preserve_order`), which the
/// heuristic column scan relies on.
pub type RawRow = serde_json::Map<String, Value>;

/// Rows accumulated over every page of one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Union of all field names in first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn push_rows(&mut self, rows: Vec<RawRow>) {
        for row in rows {
            for key in row.keys() {
                if !self.columns.iter().any(|c| c == key) {
                    self.columns.push(key.clone());
                }
            }
            self.rows.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shape of a single upstream response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// JSON rows (`{"records": [...]}` or a bare list of objects).
    Records,
    /// Delimited text whose first line is the header.
    Delimited,
}

/// The fixed semantic columns every upstream schema is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Price,
    Commodity,
    State,
    Market,
    Variety,
}

impl CanonicalField {
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Price => "price",
            CanonicalField::Commodity => "commodity",
            CanonicalField::State => "state",
            CanonicalField::Market => "market",
            CanonicalField::Variety => "variety",
        }
    }
}

/// What to do when no price-bearing column can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePolicy {
    /// Fail with `SchemaUnresolved`.
    Required,
    /// Keep producing dates, with the no-value sentinel as price.
    Optional,
}

/// A caller's request against one adapter.
///
/// Text filters are case-insensitive substring matches; `variety_keywords`
/// keeps a row if *any* keyword matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub commodity: Option<String>,
    pub variety_keywords: Vec<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Rows requested per page (`limit`).
    pub page_size: usize,
    /// Ask upstream for a delimited export and parse it as such.
    pub prefer_delimited: bool,
}

pub const DEFAULT_PAGE_SIZE: usize = 1000;

impl Default for Query {
    fn default() -> Self {
        Self {
            commodity: None,
            variety_keywords: Vec::new(),
            state: None,
            market: None,
            date_from: None,
            date_to: None,
            page_size: DEFAULT_PAGE_SIZE,
            prefer_delimited: false,
        }
    }
}

/// A RawRow reduced to the canonical fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub commodity: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub variety: Option<String>,
}

impl CanonicalRow {
    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Commodity => self.commodity.as_deref(),
            CanonicalField::State => self.state.as_deref(),
            CanonicalField::Market => self.market.as_deref(),
            CanonicalField::Variety => self.variety.as_deref(),
            CanonicalField::Date | CanonicalField::Price => None,
        }
    }
}

/// One calendar date and its mean price.
///
/// `price` is `None` when the source carried no price field at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
}

/// Date-ordered daily price series; the output of every adapter.
///
/// Dates are strictly increasing. An empty series is a valid result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<DailyPoint>", try_from = "Vec<DailyPoint>")]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    /// Column names of the tabular form.
    pub const COLUMNS: [&'static str; 2] = ["Date", "Price"];

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn from_points(points: Vec<DailyPoint>) -> Result<Self, String> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(format!(
                    "dates must be strictly increasing ({} is followed by {})",
                    pair[0].date, pair[1].date
                ));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Prices that are not the sentinel.
    pub fn priced(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.price)
    }
}

/// A date-keyed map is already ordered and duplicate-free.
impl From<BTreeMap<NaiveDate, Option<f64>>> for DailySeries {
    fn from(map: BTreeMap<NaiveDate, Option<f64>>) -> Self {
        let points = map
            .into_iter()
            .map(|(date, price)| DailyPoint { date, price })
            .collect();
        Self { points }
    }
}

impl From<DailySeries> for Vec<DailyPoint> {
    fn from(series: DailySeries) -> Self {
        series.points
    }
}

impl TryFrom<Vec<DailyPoint>> for DailySeries {
    type Error = String;

    fn try_from(points: Vec<DailyPoint>) -> Result<Self, Self::Error> {
        DailySeries::from_points(points)
    }
}
