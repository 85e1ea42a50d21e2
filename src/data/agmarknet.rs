//! Agmarknet mandi prices via the CEDA API mirror.
//!
//! This is the multi-path source: the API has moved its price endpoint
//! between releases, so several candidate paths can be configured and are
//! tried in order. Rows are market-level arrivals with `modal_price` (or a
//! `min_price`/`max_price` pair); the source is allowed to carry no price at
//! all, in which case the series keeps its dates with empty prices.

use std::time::Duration;

use crate::data::env_nonempty;
use crate::data::pager::ApiKeyAuth;
use crate::data::resolver::normalize_path;
use crate::data::source::{SourceSpec, ingest};
use crate::data::transport::{HttpTransport, Transport};
use crate::domain::{DailySeries, PricePolicy, Query};
use crate::error::IngestError;

pub const DEFAULT_BASE_URL: &str = "https://api.ceda.ashoka.edu.in";
pub const DEFAULT_PATH: &str = "/agmarknet/prices";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_COMMODITY: &str = "Paddy";

const KEY_HEADER: &str = "x-api-key";
const KEY_PARAM: &str = "api-key";

#[derive(Debug, Clone, PartialEq)]
pub struct AgmarknetConfig {
    pub base_url: String,
    /// Candidate path suffixes, in priority order.
    pub paths: Vec<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AgmarknetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            paths: vec![DEFAULT_PATH.to_string()],
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AgmarknetConfig {
    /// Defaults overridden by `AGMARKNET_BASE_URL`, `AGMARKNET_PATHS`
    /// (comma separated) and `AGMARKNET_API_KEY`, reading `.env` first.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(base) = env_nonempty("AGMARKNET_BASE_URL") {
            config.base_url = base;
        }
        if let Some(paths) = env_nonempty("AGMARKNET_PATHS") {
            let parsed = split_paths(&paths);
            if !parsed.is_empty() {
                config.paths = parsed;
            }
        }
        config.api_key = env_nonempty("AGMARKNET_API_KEY");
        config
    }
}

/// Split a comma-separated path list, normalizing each to start with `/`.
pub fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(normalize_path)
        .collect()
}

pub struct AgmarknetClient<T = HttpTransport> {
    transport: T,
    config: AgmarknetConfig,
}

impl AgmarknetClient<HttpTransport> {
    pub fn new(config: AgmarknetConfig) -> Result<Self, IngestError> {
        let transport = HttpTransport::new(config.timeout)?;
        Self::with_transport(config, transport)
    }

    pub fn from_env() -> Result<Self, IngestError> {
        Self::new(AgmarknetConfig::from_env())
    }
}

impl<T: Transport> AgmarknetClient<T> {
    pub fn with_transport(mut config: AgmarknetConfig, transport: T) -> Result<Self, IngestError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            IngestError::InvalidQuery(format!("invalid Agmarknet base URL '{}': {e}", config.base_url))
        })?;
        config.paths = config.paths.iter().map(|p| normalize_path(p)).collect();
        if config.paths.is_empty() {
            return Err(IngestError::InvalidQuery(
                "at least one Agmarknet endpoint path is required".to_string(),
            ));
        }
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &AgmarknetConfig {
        &self.config
    }

    /// Source description for `query`: server-side filters plus both key placements.
    pub fn source_spec(&self, query: &Query) -> SourceSpec {
        let mut params = Vec::new();
        let text_params = [
            ("commodity", &query.commodity),
            ("state", &query.state),
            ("market", &query.market),
        ];
        for (name, value) in text_params {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((name.to_string(), v.to_string()));
            }
        }
        if let Some(from) = query.date_from {
            params.push(("from".to_string(), from.to_string()));
        }
        if let Some(to) = query.date_to {
            params.push(("to".to_string(), to.to_string()));
        }
        if query.prefer_delimited {
            params.push(("format".to_string(), "csv".to_string()));
        }

        SourceSpec {
            name: "agmarknet",
            base_url: self.config.base_url.clone(),
            paths: self.config.paths.clone(),
            auth: ApiKeyAuth {
                key: self.config.api_key.clone(),
                header: Some(KEY_HEADER),
                query_param: Some(KEY_PARAM),
            },
            params,
            price_policy: PricePolicy::Optional,
        }
    }

    /// Fetch, normalize and aggregate prices matching `query`.
    pub fn fetch_daily(&self, query: &Query) -> Result<DailySeries, IngestError> {
        ingest(&self.transport, &self.source_spec(query), query)
    }
}
