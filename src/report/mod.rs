//! Terminal reporting for fetched or loaded series.

pub mod format;

pub use format::*;
