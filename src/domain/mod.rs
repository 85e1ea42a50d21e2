//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the caller-facing request (`Query`)
//! - upstream rows before and after normalization (`RawRow`, `RawTable`, `CanonicalRow`)
//! - the adapter output (`DailyPoint`, `DailySeries`)

pub mod types;

pub use types::*;
