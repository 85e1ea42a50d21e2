//! Candidate-path fallback.
//!
//! Upstream APIs move their endpoints around; a source may be configured with
//! several path suffixes that are tried in order. The resolver does not know
//! how a candidate is fetched: the caller injects the attempt.

use tracing::{info, warn};

use crate::error::IngestError;

/// The candidate that produced a usable payload, plus that payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub path: String,
    pub value: T,
}

/// Join a base URL and a path suffix with exactly one `/` between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_string();
    }
    format!("{base}/{}", path.trim_start_matches('/'))
}

/// Ensure a configured path suffix starts with `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Try `attempt` against each candidate in order and return the first success.
///
/// Any error from `attempt` counts as a candidate failure and the next path is
/// tried. Exhausting the list, even a list of one, yields
/// `EndpointExhausted` listing every attempted path and the last failure.
pub fn resolve<T, F>(base_url: &str, candidates: &[String], mut attempt: F) -> Result<Resolved<T>, IngestError>
where
    F: FnMut(&str) -> Result<T, IngestError>,
{
    if candidates.is_empty() {
        return Err(IngestError::InvalidQuery(format!(
            "no endpoint paths configured for {base_url}"
        )));
    }

    let mut attempted = Vec::with_capacity(candidates.len());
    let mut last_error = None;

    for path in candidates {
        attempted.push(path.clone());
        match attempt(path) {
            Ok(value) => {
                if attempted.len() > 1 {
                    info!(base_url, path = %path, failed_before = attempted.len() - 1, "endpoint resolved after fallback");
                }
                return Ok(Resolved {
                    path: path.clone(),
                    value,
                });
            }
            Err(err) => {
                warn!(base_url, path = %path, error = %err, "endpoint candidate failed");
                last_error = Some(err);
            }
        }
    }

    let last = match last_error {
        Some(err) => err,
        None => {
            return Err(IngestError::InvalidQuery(format!(
                "no endpoint paths configured for {base_url}"
            )));
        }
    };

    Err(IngestError::EndpointExhausted {
        base_url: base_url.to_string(),
        attempted,
        last: Box::new(last),
    })
}
