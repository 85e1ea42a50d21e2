//! Blocking HTTP transport behind a small trait.
//!
//! The fetcher only needs "GET this URL with these params/headers and give me
//! status, content type and body". Keeping that behind `Transport` lets the
//! pagination and fallback logic run against an in-memory transport in tests.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::IngestError;

/// One outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

/// A received response; status is not validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final request URL including the query string.
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type_lower(&self) -> String {
        self.content_type
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, IngestError>;
}

/// `reqwest` blocking client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agri-prices/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, IngestError> {
        let mut req = self.client.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send().map_err(|e| IngestError::Transport {
            url: request.url.clone(),
            message: describe_reqwest_error(e),
        })?;

        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().map_err(|e| IngestError::Transport {
            url: request.url.clone(),
            message: format!("failed to read response body: {}", describe_reqwest_error(e)),
        })?;

        Ok(HttpResponse {
            status,
            url,
            content_type,
            body,
        })
    }
}

/// The URL is stripped: it carries the query string, API key included.
fn describe_reqwest_error(e: reqwest::Error) -> String {
    let e = e.without_url();
    if e.is_timeout() {
        format!("timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

/// Replace the value of a secret query parameter before a URL goes into logs or errors.
pub fn redact_query_param(url: &str, param: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(k, _)| k == param) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == param { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
