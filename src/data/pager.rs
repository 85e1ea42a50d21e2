//! Offset/limit pagination against a resolved endpoint.

use tracing::debug;

use crate::data::negotiate::negotiate;
use crate::data::transport::{HttpRequest, HttpResponse, Transport, redact_query_param};
use crate::domain::{PayloadFormat, RawTable};
use crate::error::{IngestError, excerpt};

/// How an API key is attached to each request.
///
/// Upstreams are not consistent about where they read the key from, so both
/// placements can be active at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiKeyAuth {
    pub key: Option<String>,
    pub header: Option<&'static str>,
    pub query_param: Option<&'static str>,
}

impl ApiKeyAuth {
    pub fn none() -> Self {
        Self::default()
    }

    fn apply(&self, request: &mut HttpRequest) {
        let Some(key) = self.key.as_deref().filter(|k| !k.is_empty()) else {
            return;
        };
        if let Some(name) = self.header {
            request.headers.push((name.to_string(), key.to_string()));
        }
        if let Some(param) = self.query_param {
            if !request.query.iter().any(|(k, _)| k == param) {
                request.query.push((param.to_string(), key.to_string()));
            }
        }
    }

    /// Strip the key from a URL before it is logged or quoted in an error.
    pub fn redact(&self, url: &str) -> String {
        match self.query_param {
            Some(param) => redact_query_param(url, param),
            None => url.to_string(),
        }
    }

    /// Mask the key anywhere in a transport failure's text.
    fn scrub(&self, err: IngestError) -> IngestError {
        let Some(key) = self.key.as_deref().filter(|k| !k.is_empty()) else {
            return err;
        };
        match err {
            IngestError::Transport { url, message } => IngestError::Transport {
                url: self.redact(&url).replace(key, "***"),
                message: message.replace(key, "***"),
            },
            other => other,
        }
    }
}

/// Everything the fetcher needs besides the endpoint URL.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    /// Source-specific query parameters sent with every page.
    pub params: Vec<(String, String)>,
    pub page_size: usize,
    pub prefer_delimited: bool,
    pub auth: ApiKeyAuth,
}

/// Fetch every page from `url`, starting at offset 0.
///
/// Stops on an empty page, after a short page, or after a delimited page
/// (delimited exports do not honour `offset`). Any failure aborts the whole
/// fetch; rows from earlier pages are discarded with it.
pub fn fetch_all<T>(transport: &T, url: &str, plan: &FetchPlan) -> Result<RawTable, IngestError>
where
    T: Transport + ?Sized,
{
    if plan.page_size == 0 {
        return Err(IngestError::InvalidQuery("page size must be > 0".to_string()));
    }

    let mut table = RawTable::default();
    let mut offset = 0usize;
    let mut page_index = 0usize;

    loop {
        let request = page_request(url, plan, offset);
        let mut response = transport.get(&request).map_err(|e| plan.auth.scrub(e))?;
        response.url = plan.auth.redact(&response.url);

        check_status(&response, page_index)?;

        let page = negotiate(&response, plan.prefer_delimited)?;
        let n = page.rows.len();
        debug!(url = %response.url, page = page_index, offset, rows = n, format = ?page.format, "fetched page");

        if n == 0 {
            break;
        }
        table.push_rows(page.rows);

        if page.format == PayloadFormat::Delimited || n < plan.page_size {
            break;
        }

        offset += plan.page_size;
        page_index += 1;
    }

    Ok(table)
}

fn page_request(url: &str, plan: &FetchPlan, offset: usize) -> HttpRequest {
    let mut query = plan.params.clone();
    query.push(("limit".to_string(), plan.page_size.to_string()));
    query.push(("offset".to_string(), offset.to_string()));

    let mut request = HttpRequest {
        url: url.to_string(),
        query,
        headers: Vec::new(),
    };
    plan.auth.apply(&mut request);
    request
}

/// 4xx on the first page points at configuration (key, resource id, path),
/// so it gets its own error kinds; everything else non-2xx is `UpstreamStatus`.
fn check_status(response: &HttpResponse, page_index: usize) -> Result<(), IngestError> {
    if response.is_success() {
        return Ok(());
    }

    let status = response.status;
    let url = response.url.clone();
    let excerpt = excerpt(&response.body);

    if page_index == 0 && (400..500).contains(&status) {
        return Err(if status == 401 || status == 403 {
            IngestError::AuthRejected { status, url, excerpt }
        } else {
            IngestError::EndpointNotFound { status, url, excerpt }
        });
    }

    Err(IngestError::UpstreamStatus { status, url, excerpt })
}
