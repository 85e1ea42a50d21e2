//! Input/output helpers.
//!
//! - `Date,Price` CSV export (`export`)
//! - CSV load + validation of a saved series (`ingest`)
//! - series JSON read/write (`json`)

pub mod export;
pub mod ingest;
pub mod json;

pub use export::*;
pub use ingest::*;
pub use json::*;
