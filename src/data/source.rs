//! The ingestion pipeline shared by every upstream source.
//!
//! resolve endpoint -> paginate -> negotiate format -> normalize schema ->
//! filter -> aggregate per day.

use tracing::info;

use crate::data::pager::{ApiKeyAuth, FetchPlan, fetch_all};
use crate::data::resolver::{join_url, resolve};
use crate::data::transport::Transport;
use crate::domain::{DailySeries, PricePolicy, Query};
use crate::error::IngestError;
use crate::schema::normalize;
use crate::series::{RowFilter, aggregate_daily};

/// Everything source-specific the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    /// Short label used in logs.
    pub name: &'static str,
    pub base_url: String,
    /// Candidate path suffixes, tried in order.
    pub paths: Vec<String>,
    pub auth: ApiKeyAuth,
    /// Server-side query parameters (filters, format hints).
    pub params: Vec<(String, String)>,
    pub price_policy: PricePolicy,
}

/// Run one full adapter invocation and return the daily series.
///
/// No state is kept between calls; the same query against the same upstream
/// data yields the same series.
pub fn ingest<T>(transport: &T, source: &SourceSpec, query: &Query) -> Result<DailySeries, IngestError>
where
    T: Transport + ?Sized,
{
    if query.page_size == 0 {
        return Err(IngestError::InvalidQuery("page size must be > 0".to_string()));
    }

    let plan = FetchPlan {
        params: source.params.clone(),
        page_size: query.page_size,
        prefer_delimited: query.prefer_delimited,
        auth: source.auth.clone(),
    };

    let resolved = resolve(&source.base_url, &source.paths, |path| {
        fetch_all(transport, &join_url(&source.base_url, path), &plan)
    })?;
    let table = resolved.value;

    let normalized = normalize(&table, source.price_policy)?;
    let Some(schema) = normalized.schema else {
        info!(source = source.name, path = %resolved.path, "upstream returned no rows");
        return Ok(DailySeries::empty());
    };

    let fetched = normalized.rows.len();
    let rows = RowFilter::from_query(query).apply(normalized.rows, &schema);
    let series = aggregate_daily(&rows);

    info!(
        source = source.name,
        path = %resolved.path,
        raw_rows = table.len(),
        usable_rows = fetched,
        dropped_rows = normalized.dropped,
        kept_rows = rows.len(),
        days = series.len(),
        "ingest complete"
    );

    Ok(series)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::data::transport::{HttpRequest, HttpResponse};
    use crate::domain::DailyPoint;

    /// Serves fixed responses by URL and offset; unknown URLs get a 404.
    #[derive(Default)]
    struct RoutedTransport {
        routes: HashMap<(String, String), HttpResponse>,
        hits: RefCell<Vec<String>>,
    }

    impl RoutedTransport {
        fn json(mut self, url: &str, offset: usize, body: serde_json::Value) -> Self {
            self.routes.insert(
                (url.to_string(), offset.to_string()),
                HttpResponse {
                    status: 200,
                    url: url.to_string(),
                    content_type: Some("application/json".to_string()),
                    body: body.to_string(),
                },
            );
            self
        }
    }

    impl Transport for RoutedTransport {
        fn get(&self, request: &HttpRequest) -> Result<HttpResponse, IngestError> {
            self.hits.borrow_mut().push(request.url.clone());
            let offset = request
                .query
                .iter()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            Ok(self
                .routes
                .get(&(request.url.clone(), offset))
                .cloned()
                .unwrap_or_else(|| HttpResponse {
                    status: 404,
                    url: request.url.clone(),
                    content_type: Some("text/html".to_string()),
                    body: "<h1>Not Found</h1>".to_string(),
                }))
        }
    }

    fn source(paths: &[&str], policy: PricePolicy) -> SourceSpec {
        SourceSpec {
            name: "test",
            base_url: "https://api.test".to_string(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            auth: ApiKeyAuth::none(),
            params: Vec::new(),
            price_policy: policy,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn three_rows() -> serde_json::Value {
        json!([
            {"date": "2024-01-01", "modal_price": 100},
            {"date": "2024-01-01", "modal_price": 200},
            {"date": "2024-01-02", "modal_price": 150}
        ])
    }

    #[test]
    fn mean_price_per_day() {
        let transport = RoutedTransport::default().json("https://api.test/a", 0, three_rows());
        let series = ingest(&transport, &source(&["/a"], PricePolicy::Required), &Query::default()).unwrap();
        assert_eq!(
            series.points(),
            &[
                DailyPoint { date: d(1), price: Some(150.0) },
                DailyPoint { date: d(2), price: Some(150.0) },
            ]
        );
    }

    #[test]
    fn falls_back_past_a_missing_path() {
        let transport = RoutedTransport::default().json("https://api.test/b", 0, three_rows());
        let series = ingest(&transport, &source(&["/a", "/b"], PricePolicy::Required), &Query::default()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(*transport.hits.borrow(), vec!["https://api.test/a", "https://api.test/b"]);
    }

    #[test]
    fn repeated_calls_yield_identical_series() {
        let transport = RoutedTransport::default().json("https://api.test/a", 0, three_rows());
        let spec = source(&["/a"], PricePolicy::Required);
        let first = ingest(&transport, &spec, &Query::default()).unwrap();
        let second = ingest(&transport, &spec, &Query::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_upstream_is_an_empty_series() {
        let transport = RoutedTransport::default().json("https://api.test/a", 0, json!({"records": []}));
        let series = ingest(&transport, &source(&["/a"], PricePolicy::Required), &Query::default()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn everything_filtered_out_is_an_empty_series() {
        let body = json!([{"date": "2024-01-01", "modal_price": 1, "commodity": "Wheat"}]);
        let transport = RoutedTransport::default().json("https://api.test/a", 0, body);
        let query = Query {
            commodity: Some("Rice".into()),
            ..Query::default()
        };
        let series = ingest(&transport, &source(&["/a"], PricePolicy::Required), &query).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn min_max_prices_average_to_mid_range() {
        let body = json!([{"date": "2024-01-01", "min_price": 100, "max_price": 200}]);
        let transport = RoutedTransport::default().json("https://api.test/a", 0, body);
        let series = ingest(&transport, &source(&["/a"], PricePolicy::Optional), &Query::default()).unwrap();
        assert_eq!(series.points(), &[DailyPoint { date: d(1), price: Some(150.0) }]);
    }

    #[test]
    fn unresolvable_schema_is_an_error() {
        let body = json!([{"market": "Karnal", "arrivals": 10}]);
        let transport = RoutedTransport::default().json("https://api.test/a", 0, body);
        let err = ingest(&transport, &source(&["/a"], PricePolicy::Required), &Query::default()).unwrap_err();
        assert!(matches!(err, IngestError::SchemaUnresolved { field: "date", .. }));
    }

    #[test]
    fn zero_page_size_is_rejected_before_any_request() {
        let transport = RoutedTransport::default();
        let query = Query {
            page_size: 0,
            ..Query::default()
        };
        let err = ingest(&transport, &source(&["/a"], PricePolicy::Required), &query).unwrap_err();
        assert!(matches!(err, IngestError::InvalidQuery(_)));
        assert!(transport.hits.borrow().is_empty());
    }

    #[test]
    fn all_paths_missing_is_exhausted() {
        let transport = RoutedTransport::default();
        let err = ingest(&transport, &source(&["/a", "/b"], PricePolicy::Required), &Query::default()).unwrap_err();
        match err {
            IngestError::EndpointExhausted { attempted, last, .. } => {
                assert_eq!(attempted, vec!["/a", "/b"]);
                assert!(matches!(*last, IngestError::EndpointNotFound { status: 404, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
