//! data.gov.in resource API (Open Government Data platform).
//!
//! Each dataset lives at `<base>/<resource id>`; there is only ever one
//! candidate path. The key is mandatory and only accepted as the `api-key`
//! query parameter.

use std::time::Duration;

use crate::data::env_nonempty;
use crate::data::pager::ApiKeyAuth;
use crate::data::source::{SourceSpec, ingest};
use crate::data::transport::{HttpTransport, Transport};
use crate::domain::{DailySeries, PricePolicy, Query};
use crate::error::IngestError;

pub const DEFAULT_BASE_URL: &str = "https://api.data.gov.in/resource";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_COMMODITY: &str = "Rice";

const KEY_PARAM: &str = "api-key";

/// Accept a bare resource id, `resource/<id>`, or a full resource URL.
pub fn extract_resource_id(raw: &str) -> Result<String, IngestError> {
    let s = raw.trim().trim_end_matches('/');
    let id = if let Some((_, tail)) = s.rsplit_once("/resource/") {
        tail
    } else if let Some(tail) = s.strip_prefix("resource/") {
        tail
    } else {
        s
    };
    let id = id.split(['?', '#']).next().unwrap_or_default().trim();

    if id.is_empty() || id.contains('/') {
        return Err(IngestError::InvalidQuery(format!(
            "invalid resource id '{raw}': use the dataset UUID, e.g. 9ef84268-d588-465a-a308-a864a43d0070"
        )));
    }
    Ok(id.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataGovConfig {
    pub base_url: String,
    pub resource_id: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl DataGovConfig {
    /// `DATAGOV_API_KEY` is required; `DATAGOV_BASE_URL` is optional.
    pub fn from_env(resource_id: &str) -> Result<Self, IngestError> {
        dotenvy::dotenv().ok();
        let api_key = env_nonempty("DATAGOV_API_KEY").ok_or_else(|| {
            IngestError::InvalidQuery("missing DATAGOV_API_KEY in environment (.env)".to_string())
        })?;
        Ok(Self {
            base_url: env_nonempty("DATAGOV_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            resource_id: extract_resource_id(resource_id)?,
            api_key,
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

pub struct DataGovClient<T = HttpTransport> {
    transport: T,
    config: DataGovConfig,
}

impl DataGovClient<HttpTransport> {
    pub fn new(config: DataGovConfig) -> Result<Self, IngestError> {
        let transport = HttpTransport::new(config.timeout)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> DataGovClient<T> {
    pub fn with_transport(mut config: DataGovConfig, transport: T) -> Result<Self, IngestError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            IngestError::InvalidQuery(format!("invalid data.gov.in base URL '{}': {e}", config.base_url))
        })?;
        if config.api_key.trim().is_empty() {
            return Err(IngestError::InvalidQuery("data.gov.in requires an API key".to_string()));
        }
        config.resource_id = extract_resource_id(&config.resource_id)?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &DataGovConfig {
        &self.config
    }

    /// Only the date range is sent upstream; text filters run client-side.
    pub fn source_spec(&self, query: &Query) -> SourceSpec {
        let format = if query.prefer_delimited { "csv" } else { "json" };
        let mut params = vec![("format".to_string(), format.to_string())];
        if let Some(from) = query.date_from {
            params.push(("from".to_string(), from.to_string()));
        }
        if let Some(to) = query.date_to {
            params.push(("to".to_string(), to.to_string()));
        }

        SourceSpec {
            name: "datagov",
            base_url: self.config.base_url.clone(),
            paths: vec![format!("/{}", self.config.resource_id)],
            auth: ApiKeyAuth {
                key: Some(self.config.api_key.clone()),
                header: None,
                query_param: Some(KEY_PARAM),
            },
            params,
            price_policy: PricePolicy::Required,
        }
    }

    pub fn fetch_daily(&self, query: &Query) -> Result<DailySeries, IngestError> {
        ingest(&self.transport, &self.source_spec(query), query)
    }
}
