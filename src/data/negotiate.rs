//! Response-format negotiation: JSON records vs. delimited export.

use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};

use crate::data::transport::HttpResponse;
use crate::domain::{PayloadFormat, RawRow};
use crate::error::{IngestError, excerpt};

/// Rows decoded from one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub format: PayloadFormat,
    pub rows: Vec<RawRow>,
}

/// Decide the payload format from the caller preference and the declared content type.
pub fn payload_format(content_type: &str, prefer_delimited: bool) -> PayloadFormat {
    if prefer_delimited || content_type.to_ascii_lowercase().contains("csv") {
        PayloadFormat::Delimited
    } else {
        PayloadFormat::Records
    }
}

/// Decode a response whose status has already been checked.
///
/// An empty delimited body, or a records list with no entries, is a normal
/// empty page. A body that does not decode as the expected structure is a
/// `MalformedPayload` quoting the start of the body.
pub fn negotiate(response: &HttpResponse, prefer_delimited: bool) -> Result<Page, IngestError> {
    let content_type = response.content_type.clone().unwrap_or_default();
    let format = payload_format(&content_type, prefer_delimited);

    let rows = match format {
        PayloadFormat::Delimited => parse_delimited(&response.body),
        PayloadFormat::Records => parse_records(&response.body),
    }
    .map_err(|reason| IngestError::MalformedPayload {
        url: response.url.clone(),
        content_type: if content_type.is_empty() {
            "<none>".to_string()
        } else {
            content_type.clone()
        },
        reason,
        excerpt: excerpt(&response.body),
    })?;

    Ok(Page { format, rows })
}

fn parse_records(body: &str) -> Result<Vec<RawRow>, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| format!("not valid JSON ({e})"))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("records").or_else(|| obj.remove("data")) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(format!(
                    "expected `records` to be a list, found {}",
                    json_kind(&other)
                ));
            }
            None => {
                let keys: Vec<&str> = obj.keys().map(String::as_str).take(10).collect();
                return Err(format!(
                    "JSON object has no `records` list (keys: {})",
                    keys.join(", ")
                ));
            }
        },
        other => return Err(format!("expected a list of records, found {}", json_kind(&other))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(row) => Ok(lowercase_keys(row)),
            other => Err(format!("record #{idx} is {}, not an object", json_kind(&other))),
        })
        .collect()
}

fn parse_delimited(body: &str) -> Result<Vec<RawRow>, String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("unreadable CSV header ({e})"))?
        .iter()
        .map(normalize_field_name)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("unreadable CSV record at line {} ({e})", idx + 2))?;
        let mut row = Map::new();
        for (col, header) in headers.iter().enumerate() {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            row.insert(header.clone(), coerce_cell(record.get(col).unwrap_or("")));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Lower-case field names; on collision the first occurrence wins.
pub fn lowercase_keys(row: Map<String, Value>) -> RawRow {
    let mut out = Map::new();
    for (key, value) in row {
        let key = normalize_field_name(&key);
        if !out.contains_key(&key) {
            out.insert(key, value);
        }
    }
    out
}

fn normalize_field_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn coerce_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    // Only lossless conversions: codes like `0012` must keep their text.
    if let Ok(i) = trimmed.parse::<i64>() {
        if i.to_string() == trimmed {
            return Value::Number(i.into());
        }
    } else if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        if n.to_string() == trimmed {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            url: "https://api.test/prices?limit=10".to_string(),
            content_type: Some(content_type.to_string()),
            body: body.to_string(),
        }
    }

    #[test]
    fn records_object_is_decoded_with_lowercase_keys() {
        let body = r#"{"total": 2, "records": [{"Arrival_Date": "01/01/2024", "Modal_Price": "100"}]}"#;
        let page = negotiate(&response("application/json", body), false).unwrap();
        assert_eq!(page.format, PayloadFormat::Records);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0]["arrival_date"], json!("01/01/2024"));
        assert_eq!(page.rows[0]["modal_price"], json!("100"));
    }

    #[test]
    fn bare_list_is_accepted() {
        let body = r#"[{"date": "2024-01-01", "modal_price": 100}, {"date": "2024-01-02", "modal_price": 150}]"#;
        let page = negotiate(&response("application/json", body), false).unwrap();
        assert_eq!(page.rows.len(), 2);
    }

    #[test]
    fn empty_records_list_is_an_empty_page() {
        let page = negotiate(&response("application/json", r#"{"records": []}"#), false).unwrap();
        assert!(page.rows.is_empty());
    }

    #[test]
    fn html_error_page_with_200_is_malformed_with_excerpt() {
        let body = "<html><body>Service temporarily unavailable</body></html>";
        let err = negotiate(&response("text/html; charset=utf-8", body), false).unwrap_err();
        match err {
            IngestError::MalformedPayload {
                content_type,
                excerpt,
                ..
            } => {
                assert_eq!(content_type, "text/html; charset=utf-8");
                assert!(excerpt.contains("Service temporarily unavailable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn object_without_records_is_malformed() {
        let body = r#"{"status": "error", "message": "invalid key"}"#;
        let err = negotiate(&response("application/json", body), false).unwrap_err();
        assert!(err.to_string().contains("no `records` list"));
        assert!(err.to_string().contains("invalid key"));
    }

    #[test]
    fn csv_content_type_selects_delimited_parsing() {
        let body = "\u{feff}State,Centre,Date,Retail\nDelhi,Delhi,2024-01-01,45.5\nDelhi,Delhi,2024-01-02,\n";
        let page = negotiate(&response("text/csv", body), false).unwrap();
        assert_eq!(page.format, PayloadFormat::Delimited);
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0]["state"], json!("Delhi"));
        assert_eq!(page.rows[0]["retail"], json!(45.5));
        assert_eq!(page.rows[1]["retail"], Value::Null);
    }

    #[test]
    fn preference_forces_delimited_even_for_json_content_type() {
        let page = negotiate(&response("application/json", "date,price\n2024-01-01,3\n"), true).unwrap();
        assert_eq!(page.format, PayloadFormat::Delimited);
        assert_eq!(page.rows[0]["price"], json!(3));
    }

    #[test]
    fn csv_codes_keep_their_text() {
        let body = "market,variety,price\n0012,1121,2500.50\n";
        let page = negotiate(&response("text/csv", body), false).unwrap();
        assert_eq!(page.rows[0]["market"], json!("0012"));
        assert_eq!(page.rows[0]["variety"], json!(1121));
        assert_eq!(page.rows[0]["price"], json!("2500.50"));
        assert_eq!(coerce_cell("-7"), json!(-7));
        assert_eq!(coerce_cell("+7"), json!("+7"));
    }

    #[test]
    fn header_only_csv_is_an_empty_page() {
        let page = negotiate(&response("text/csv", "date,price\n"), false).unwrap();
        assert!(page.rows.is_empty());
        let page = negotiate(&response("text/csv", ""), false).unwrap();
        assert!(page.rows.is_empty());
    }
}
