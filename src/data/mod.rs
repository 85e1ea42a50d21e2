//! Upstream price sources and the HTTP plumbing they share.
//!
//! - `transport`: blocking HTTP behind a small trait
//! - `resolver`: ordered candidate-path fallback
//! - `pager`: offset/limit pagination
//! - `negotiate`: JSON vs delimited payload parsing
//! - `source`: the end-to-end ingest pipeline
//! - `agmarknet` / `datagov`: the two concrete sources

pub mod agmarknet;
pub mod datagov;
pub mod negotiate;
pub mod pager;
pub mod resolver;
pub mod source;
pub mod transport;

pub use agmarknet::{AgmarknetClient, AgmarknetConfig};
pub use datagov::{DataGovClient, DataGovConfig, extract_resource_id};
pub use source::{SourceSpec, ingest};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// Read an environment variable, treating blank values as unset.
pub(crate) fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
