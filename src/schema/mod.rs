//! Schema normalization: map an upstream table onto the canonical fields.
//!
//! Two tiers, kept separate so each can be tested alone:
//!
//! - alias tier (`alias`): exact, priority-ordered field-name lookup
//! - heuristic tier (`probe`): type-probing scan, used only when no alias matches
//!
//! Once the columns are chosen, every row is coerced. Rows whose date (or,
//! when a price column exists, price) does not coerce are dropped.

pub mod alias;
pub mod probe;

use tracing::{debug, warn};

use crate::domain::{CanonicalField, CanonicalRow, PricePolicy, RawRow, RawTable};
use crate::error::IngestError;

pub use alias::PriceColumn;

/// Which tier chose a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Alias,
    Heuristic,
}

/// Upstream columns chosen for each canonical field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub date: String,
    pub date_tier: Tier,
    /// `None` only under `PricePolicy::Optional`.
    pub price: Option<PriceColumn>,
    pub price_tier: Option<Tier>,
    pub commodity: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
    pub variety: Option<String>,
}

impl ResolvedSchema {
    /// Whether the upstream schema carries `field` at all.
    pub fn has(&self, field: CanonicalField) -> bool {
        match field {
            CanonicalField::Date => true,
            CanonicalField::Price => self.price.is_some(),
            CanonicalField::Commodity => self.commodity.is_some(),
            CanonicalField::State => self.state.is_some(),
            CanonicalField::Market => self.market.is_some(),
            CanonicalField::Variety => self.variety.is_some(),
        }
    }
}

/// Normalized rows plus the schema that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// `None` when the table was empty and nothing had to be resolved.
    pub schema: Option<ResolvedSchema>,
    pub rows: Vec<CanonicalRow>,
    /// Rows discarded because date or price failed to coerce.
    pub dropped: usize,
}

/// Choose the date, price and categorical columns for `table`.
pub fn resolve_schema(table: &RawTable, policy: PricePolicy) -> Result<ResolvedSchema, IngestError> {
    let columns = &table.columns;

    let commodity = alias::lookup(columns, CanonicalField::Commodity);
    let state = alias::lookup(columns, CanonicalField::State);
    let market = alias::lookup(columns, CanonicalField::Market);
    let variety = alias::lookup(columns, CanonicalField::Variety);

    let mut claimed: Vec<&str> = [&commodity, &state, &market, &variety]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();

    let (date, date_tier) = match alias::lookup(columns, CanonicalField::Date) {
        Some(c) => (c, Tier::Alias),
        None => match probe::probe_date_column(table, &claimed) {
            Some(c) => (c, Tier::Heuristic),
            None => {
                return Err(IngestError::SchemaUnresolved {
                    field: "date",
                    columns: columns.clone(),
                });
            }
        },
    };
    claimed.push(date.as_str());

    let (price, price_tier) = match alias::lookup_price(columns) {
        Some(p) => (Some(p), Some(Tier::Alias)),
        None => match probe::probe_numeric_column(table, &claimed) {
            Some(c) => (Some(PriceColumn::Single(c)), Some(Tier::Heuristic)),
            None => match policy {
                PricePolicy::Required => {
                    return Err(IngestError::SchemaUnresolved {
                        field: "numeric price",
                        columns: columns.clone(),
                    });
                }
                PricePolicy::Optional => {
                    warn!(columns = ?columns, "no price column found; daily prices will be empty");
                    (None, None)
                }
            },
        },
    };

    let schema = ResolvedSchema {
        date,
        date_tier,
        price,
        price_tier,
        commodity,
        state,
        market,
        variety,
    };
    debug!(?schema, "resolved schema");
    Ok(schema)
}

/// Resolve the schema and coerce every row onto it.
pub fn normalize(table: &RawTable, policy: PricePolicy) -> Result<Normalized, IngestError> {
    if table.is_empty() {
        return Ok(Normalized {
            schema: None,
            rows: Vec::new(),
            dropped: 0,
        });
    }

    let schema = resolve_schema(table, policy)?;

    let mut rows = Vec::with_capacity(table.len());
    let mut dropped = 0usize;
    for raw in &table.rows {
        match coerce_row(raw, &schema) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = rows.len(), "dropped rows with unparseable date/price");
    }

    Ok(Normalized {
        schema: Some(schema),
        rows,
        dropped,
    })
}

/// `None` when a required coercion fails.
fn coerce_row(raw: &RawRow, schema: &ResolvedSchema) -> Option<CanonicalRow> {
    let date = raw.get(&schema.date).and_then(probe::parse_date_value)?;

    let price = match &schema.price {
        None => None,
        Some(PriceColumn::Single(c)) => Some(number(raw, c)?),
        Some(PriceColumn::MidRange { min, max }) => Some((number(raw, min)? + number(raw, max)?) / 2.0),
    };

    let text = |col: &Option<String>| {
        col.as_ref()
            .and_then(|c| raw.get(c))
            .and_then(probe::text_value)
    };

    Some(CanonicalRow {
        date: Some(date),
        price,
        commodity: text(&schema.commodity),
        state: text(&schema.state),
        market: text(&schema.market),
        variety: text(&schema.variety),
    })
}

fn number(raw: &RawRow, column: &str) -> Option<f64> {
    raw.get(column).and_then(probe::parse_number_value)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    use super::*;

    fn table(rows: Vec<Value>) -> RawTable {
        let mut t = RawTable::default();
        t.push_rows(rows.into_iter().map(|r| r.as_object().unwrap().clone()).collect());
        t
    }

    #[test]
    fn alias_price_outranks_unrelated_numeric_column() {
        let t = table(vec![
            json!({"arrivals": 12, "date": "2024-01-01", "modal_price": 100}),
            json!({"arrivals": 30, "date": "2024-01-02", "modal_price": 110}),
        ]);
        let schema = resolve_schema(&t, PricePolicy::Required).unwrap();
        assert_eq!(schema.price, Some(PriceColumn::Single("modal_price".to_string())));
        assert_eq!(schema.price_tier, Some(Tier::Alias));
        assert_eq!(schema.date_tier, Tier::Alias);
    }

    #[test]
    fn heuristic_tier_used_when_no_alias_matches() {
        let t = table(vec![
            json!({"centre": "Delhi", "obs_on": "01/02/2024", "rs_per_kg": "41.5"}),
            json!({"centre": "Delhi", "obs_on": "02/02/2024", "rs_per_kg": "42"}),
        ]);
        let schema = resolve_schema(&t, PricePolicy::Required).unwrap();
        assert_eq!(schema.date, "obs_on");
        assert_eq!(schema.date_tier, Tier::Heuristic);
        assert_eq!(schema.price, Some(PriceColumn::Single("rs_per_kg".to_string())));
        assert_eq!(schema.price_tier, Some(Tier::Heuristic));
        assert_eq!(schema.market.as_deref(), Some("centre"));
    }

    #[test]
    fn missing_date_column_is_unresolved() {
        let t = table(vec![json!({"state": "Punjab", "modal_price": 100})]);
        let err = resolve_schema(&t, PricePolicy::Required).unwrap_err();
        assert!(matches!(err, IngestError::SchemaUnresolved { field: "date", .. }));
    }

    #[test]
    fn missing_price_depends_on_policy() {
        let t = table(vec![json!({"date": "2024-01-01", "market": "Karnal"})]);
        let err = resolve_schema(&t, PricePolicy::Required).unwrap_err();
        assert!(matches!(err, IngestError::SchemaUnresolved { field: "numeric price", .. }));

        let schema = resolve_schema(&t, PricePolicy::Optional).unwrap();
        assert_eq!(schema.price, None);
        assert!(!schema.has(CanonicalField::Price));
    }

    #[test]
    fn rows_failing_coercion_are_dropped() {
        let t = table(vec![
            json!({"date": "2024-01-01", "modal_price": "100"}),
            json!({"date": "not a date", "modal_price": "100"}),
            json!({"date": "2024-01-02", "modal_price": "NR"}),
            json!({"date": "2024-01-03"}),
        ]);
        let out = normalize(&t, PricePolicy::Required).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.dropped, 3);
        assert_eq!(out.rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(out.rows[0].price, Some(100.0));
    }

    #[test]
    fn min_max_rows_are_priced_at_mid_range() {
        let t = table(vec![json!({"date": "2024-01-01", "min_price": 100, "max_price": 200})]);
        let out = normalize(&t, PricePolicy::Optional).unwrap();
        assert_eq!(out.rows[0].price, Some(150.0));
    }

    #[test]
    fn empty_table_needs_no_schema() {
        let out = normalize(&RawTable::default(), PricePolicy::Required).unwrap();
        assert!(out.schema.is_none());
        assert!(out.rows.is_empty());
    }

    #[test]
    fn categorical_fields_are_carried() {
        let t = table(vec![json!({
            "date": "2024-01-01",
            "modal_price": 3900,
            "commodity": "Paddy(Dhan)(Basmati)",
            "state": "Haryana",
            "market": "Karnal",
            "variety": "1121"
        })]);
        let out = normalize(&t, PricePolicy::Optional).unwrap();
        let row = &out.rows[0];
        assert_eq!(row.commodity.as_deref(), Some("Paddy(Dhan)(Basmati)"));
        assert_eq!(row.state.as_deref(), Some("Haryana"));
        assert_eq!(row.market.as_deref(), Some("Karnal"));
        assert_eq!(row.variety.as_deref(), Some("1121"));
    }
}
