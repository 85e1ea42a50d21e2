//! `agri-prices` library crate.
//!
//! Fetches agricultural commodity prices from Indian open-data APIs and
//! reduces them to a daily `Date,Price` series. The binary (`agri`) is a thin
//! wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the adapters can be embedded by other tools (dashboards, notebooks)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod schema;
pub mod series;
