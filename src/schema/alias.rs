//! Alias tier: fixed, priority-ordered field-name lookup.
//!
//! Rules are evaluated in table order and the first alias present wins, so a
//! schema carrying both `price` and `wholesale_price` always resolves to the
//! same column.

use crate::domain::CanonicalField;

/// One `(alias set -> canonical field)` rule.
#[derive(Debug, Clone, Copy)]
pub struct AliasRule {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
}

pub const ALIAS_RULES: &[AliasRule] = &[
    AliasRule {
        field: CanonicalField::Date,
        aliases: &[
            "date",
            "arrival_date",
            "reported_date",
            "price_date",
            "created_date",
            "month",
            "day",
        ],
    },
    AliasRule {
        field: CanonicalField::Price,
        aliases: &[
            "retail",
            "wholesale",
            "modal_price",
            "price",
            "wholesale_price",
            "retail_price",
        ],
    },
    AliasRule {
        field: CanonicalField::Commodity,
        aliases: &["commodity", "commodity_name", "item"],
    },
    AliasRule {
        field: CanonicalField::State,
        aliases: &["state", "state_name"],
    },
    AliasRule {
        field: CanonicalField::Market,
        aliases: &["market", "centre", "center", "market_name", "market_centre"],
    },
    AliasRule {
        field: CanonicalField::Variety,
        aliases: &["variety", "variety_name"],
    },
];

/// Dual low/high price columns, used when no single price alias matches.
pub const PRICE_RANGE_ALIASES: &[(&str, &str)] = &[
    ("min_price", "max_price"),
    ("minimum_price", "maximum_price"),
];

/// Where a row's price comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceColumn {
    Single(String),
    /// Per-row price is `(min + max) / 2`.
    MidRange { min: String, max: String },
}

impl PriceColumn {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            PriceColumn::Single(c) => vec![c.as_str()],
            PriceColumn::MidRange { min, max } => vec![min.as_str(), max.as_str()],
        }
    }
}

pub fn aliases_for(field: CanonicalField) -> &'static [&'static str] {
    ALIAS_RULES
        .iter()
        .find(|rule| rule.field == field)
        .map(|rule| rule.aliases)
        .unwrap_or(&[])
}

/// First alias of `field` (in priority order) present among `columns`.
pub fn lookup(columns: &[String], field: CanonicalField) -> Option<String> {
    aliases_for(field)
        .iter()
        .find(|alias| columns.iter().any(|c| c == *alias))
        .map(|alias| alias.to_string())
}

/// Single price aliases first, then the min/max pairs.
pub fn lookup_price(columns: &[String]) -> Option<PriceColumn> {
    if let Some(single) = lookup(columns, CanonicalField::Price) {
        return Some(PriceColumn::Single(single));
    }
    let has = |name: &str| columns.iter().any(|c| c == name);
    PRICE_RANGE_ALIASES
        .iter()
        .find(|(min, max)| has(min) && has(max))
        .map(|(min, max)| PriceColumn::MidRange {
            min: min.to_string(),
            max: max.to_string(),
        })
}
