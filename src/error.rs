use thiserror::Error;

/// Number of body characters kept when an upstream response is quoted in an error.
pub const EXCERPT_CHARS: usize = 300;

/// Failures raised by the ingestion pipeline.
///
/// Every variant carries enough upstream context (URL, attempted paths, body
/// excerpt) to tell which assumption about the remote API broke.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(
        "all candidate endpoints failed under {base_url} (tried: {}); last error: {last}",
        .attempted.join(", ")
    )]
    EndpointExhausted {
        base_url: String,
        attempted: Vec<String>,
        #[source]
        last: Box<IngestError>,
    },

    #[error("upstream rejected the API key (HTTP {status}) for {url}; response: {excerpt}")]
    AuthRejected { status: u16, url: String, excerpt: String },

    #[error(
        "endpoint not found or not accepted (HTTP {status}) for {url}; check the resource id / path; response: {excerpt}"
    )]
    EndpointNotFound { status: u16, url: String, excerpt: String },

    #[error("upstream returned HTTP {status} for {url}; response: {excerpt}")]
    UpstreamStatus { status: u16, url: String, excerpt: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("malformed payload from {url} (content-type: {content_type}): {reason}; body starts with: {excerpt}")]
    MalformedPayload {
        url: String,
        content_type: String,
        reason: String,
        excerpt: String,
    },

    #[error("no {field} column could be identified among [{}]", .columns.join(", "))]
    SchemaUnresolved { field: &'static str, columns: Vec<String> },

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl IngestError {
    /// The failure underneath any `EndpointExhausted` wrapping.
    pub fn root_cause(&self) -> &IngestError {
        match self {
            IngestError::EndpointExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

/// Cut a response body down to a short, single-line excerpt.
pub fn excerpt(body: &str) -> String {
    let flat: String = body
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let mut out: String = flat.chars().take(EXCERPT_CHARS).collect();
    if flat.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    if out.is_empty() {
        out.push_str("<empty body>");
    }
    out
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let exit_code = match err.root_cause() {
            IngestError::InvalidQuery(_) => 2,
            IngestError::SchemaUnresolved { .. } => 3,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_truncates_and_flattens() {
        let body = format!("<html>\n<body>{}</body></html>", "x".repeat(400));
        let ex = excerpt(&body);
        assert!(ex.starts_with("<html> <body>"));
        assert!(ex.ends_with("..."));
        assert_eq!(ex.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn excerpt_marks_empty_body() {
        assert_eq!(excerpt("   "), "<empty body>");
    }

    #[test]
    fn exhausted_error_lists_every_path_and_last_failure() {
        let err = IngestError::EndpointExhausted {
            base_url: "https://example.test".to_string(),
            attempted: vec!["/a".to_string(), "/b".to_string()],
            last: Box::new(IngestError::EndpointNotFound {
                status: 404,
                url: "https://example.test/b".to_string(),
                excerpt: "nope".to_string(),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("tried: /a, /b"));
        assert!(text.contains("HTTP 404"));
        assert!(text.contains("https://example.test/b"));
    }

    #[test]
    fn app_error_exit_codes_follow_error_kind() {
        let schema = IngestError::SchemaUnresolved {
            field: "date",
            columns: vec!["a".to_string()],
        };
        assert_eq!(AppError::from(schema).exit_code(), 3);
        assert_eq!(AppError::from(IngestError::InvalidQuery("x".into())).exit_code(), 2);
        let transport = IngestError::Transport {
            url: "u".into(),
            message: "timeout".into(),
        };
        assert_eq!(AppError::from(transport).exit_code(), 4);
    }

    #[test]
    fn exhausted_error_exits_by_its_underlying_kind() {
        let wrapped = IngestError::EndpointExhausted {
            base_url: "https://example.test".to_string(),
            attempted: vec!["/p".to_string()],
            last: Box::new(IngestError::InvalidQuery("page size must be > 0".into())),
        };
        assert!(matches!(wrapped.root_cause(), IngestError::InvalidQuery(_)));
        assert_eq!(AppError::from(wrapped).exit_code(), 2);
    }
}
