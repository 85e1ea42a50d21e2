//! Filtering and daily aggregation of normalized rows.

pub mod daily;
pub mod filter;

pub use daily::aggregate_daily;
pub use filter::RowFilter;
