//! Query service REST backend.
//!
//! Each statement is a form POST to `<endpoint>/query/service` carrying the
//! statement plus every mirrored request parameter. The JSON response is
//! buffered and replayed through a [`VecCursor`].

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value as JsonValue};

use super::{BackendError, BackendResult, Connector, QueryBackend, RowCursor, VecCursor};

/// Path of the statement endpoint on a query node.
const SERVICE_PATH: &str = "/query/service";

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Backend talking to a query node over HTTP.
pub struct HttpBackend {
    endpoint: String,
    service_url: String,
    client: reqwest::Client,
    params: RwLock<BTreeMap<String, String>>,
}

impl HttpBackend {
    /// Create a backend for `endpoint`, e.g. `http://localhost:8093`.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> BackendResult<Self> {
        let service_url = service_url(endpoint)?;
        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .map_err(|e| BackendError::Connect(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            service_url,
            client,
            params: RwLock::new(BTreeMap::new()),
        })
    }

    fn form(&self, statement: &str) -> Vec<(String, String)> {
        let params = self.params.read().unwrap_or_else(|e| e.into_inner());
        let mut form = Vec::with_capacity(params.len() + 1);
        form.push(("statement".to_string(), statement.to_string()));
        form.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        form
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    #[tracing::instrument(level = "debug", skip(self), fields(url = %self.service_url))]
    async fn execute(&self, statement: &str) -> BackendResult<Box<dyn RowCursor>> {
        let response = self
            .client
            .post(&self.service_url)
            .form(&self.form(statement))
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        let parsed: JsonValue = serde_json::from_slice(&body).map_err(|e| {
            BackendError::Query(format!("HTTP {}: unreadable response: {}", status.as_u16(), e))
        })?;
        let JsonValue::Object(response) = parsed else {
            return Err(BackendError::Query(format!(
                "HTTP {}: response is not a JSON object",
                status.as_u16()
            )));
        };

        if let Some(errors) = response.get("errors").filter(|e| has_entries(e)) {
            if response.get("results").map_or(true, |r| !has_entries(r)) {
                return Err(BackendError::Query(errors.to_string()));
            }
        }

        Ok(Box::new(cursor_from_response(response)?))
    }

    fn set_parameter(&self, key: &str, value: &str) {
        let mut params = self.params.write().unwrap_or_else(|e| e.into_inner());
        params.insert(key.to_string(), value.to_string());
    }

    fn unset_parameter(&self, key: &str) {
        let mut params = self.params.write().unwrap_or_else(|e| e.into_inner());
        params.remove(key);
    }
}

/// Builds an [`HttpBackend`] per `\CONNECT`.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    timeout: Option<Duration>,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Connector for HttpConnector {
    fn connect(&self, endpoint: &str) -> BackendResult<Arc<dyn QueryBackend>> {
        Ok(Arc::new(HttpBackend::new(endpoint, self.timeout)?))
    }
}

fn service_url(endpoint: &str) -> BackendResult<String> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(BackendError::InvalidEndpoint(endpoint.to_string()));
    }
    if trimmed.ends_with(SERVICE_PATH) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}{SERVICE_PATH}"))
    }
}

fn has_entries(value: &JsonValue) -> bool {
    match value {
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Null => false,
        _ => true,
    }
}

/// Lay a buffered response out as cursor rows.
///
/// Columns come from the signature's keys. A `*` signature or a missing one
/// means each result is a whole document, held in a single column.
fn cursor_from_response(mut response: Map<String, JsonValue>) -> BackendResult<VecCursor> {
    let signature = response.remove("signature").unwrap_or(JsonValue::Null);
    let columns: Vec<String> = match &signature {
        JsonValue::Object(fields) if !fields.is_empty() && !fields.contains_key("*") => {
            fields.keys().cloned().collect()
        }
        _ => vec!["*".to_string()],
    };
    let whole_document = columns.len() == 1 && columns[0] == "*";

    let metadata = json!({
        "requestID": response.remove("requestID").unwrap_or(JsonValue::Null),
        "signature": signature,
        "status": response.remove("status").unwrap_or(JsonValue::Null),
    });
    let mut rows = vec![first_cell_row(&metadata, columns.len())?];

    match response.remove("metrics") {
        Some(metrics) => rows.push(first_cell_row(&metrics, columns.len())?),
        None => rows.push(vec![Vec::new(); columns.len()]),
    }

    let results = match response.remove("results") {
        Some(JsonValue::Array(items)) => items,
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => vec![other],
    };
    for result in results {
        let row = if whole_document {
            vec![encode(&result)?]
        } else {
            columns
                .iter()
                .map(|column| match result.get(column) {
                    Some(value) => encode(value),
                    None => Ok(Vec::new()),
                })
                .collect::<BackendResult<Vec<_>>>()?
        };
        rows.push(row);
    }

    Ok(VecCursor::new(columns, rows))
}

fn first_cell_row(value: &JsonValue, width: usize) -> BackendResult<Vec<Vec<u8>>> {
    let mut row = vec![Vec::new(); width.max(1)];
    row[0] = encode(value)?;
    Ok(row)
}

fn encode(value: &JsonValue) -> BackendResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| BackendError::Scan(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url() {
        assert_eq!(service_url("http://localhost:8093").unwrap(), "http://localhost:8093/query/service");
        assert_eq!(service_url("http://h:8093/").unwrap(), "http://h:8093/query/service");
        assert_eq!(service_url("https://h/query/service").unwrap(), "https://h/query/service");
        assert!(matches!(service_url("localhost:8093"), Err(BackendError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_response_rows_follow_signature() {
        let response: JsonValue = serde_json::from_str(
            r#"{
                "requestID": "r-1",
                "signature": {"a": "number", "b": "string"},
                "results": [{"a": 1, "b": "x"}, {"a": 2}],
                "status": "success",
                "metrics": {"resultCount": 2}
            }"#,
        )
        .unwrap();
        let JsonValue::Object(map) = response else { unreachable!() };
        let mut cursor = cursor_from_response(map).unwrap();

        assert_eq!(cursor.columns(), ["a", "b"]);
        assert!(cursor.next().await.unwrap());
        let meta: JsonValue = serde_json::from_slice(&cursor.scan().unwrap()[0]).unwrap();
        assert_eq!(meta["requestID"], "r-1");
        assert_eq!(meta["status"], "success");

        assert!(cursor.next().await.unwrap());
        let metrics: JsonValue = serde_json::from_slice(&cursor.scan().unwrap()[0]).unwrap();
        assert_eq!(metrics["resultCount"], 2);

        assert!(cursor.next().await.unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![b"1".to_vec(), b"\"x\"".to_vec()]);
        assert!(cursor.next().await.unwrap());
        assert_eq!(cursor.scan().unwrap(), vec![b"2".to_vec(), Vec::new()]);
        assert!(!cursor.next().await.unwrap());
    }

    #[tokio::test]
    async fn test_star_signature_is_one_column() {
        let response = json!({
            "signature": {"*": "*"},
            "results": [{"name": "beer"}],
            "status": "success"
        });
        let JsonValue::Object(map) = response else { unreachable!() };
        let mut cursor = cursor_from_response(map).unwrap();
        assert_eq!(cursor.columns(), ["*"]);
        cursor.next().await.unwrap();
        cursor.next().await.unwrap();
        // Missing metrics leave row 1 blank.
        assert_eq!(cursor.scan().unwrap(), vec![Vec::<u8>::new()]);
        cursor.next().await.unwrap();
        assert_eq!(cursor.scan().unwrap(), vec![br#"{"name":"beer"}"#.to_vec()]);
    }

    #[test]
    fn test_parameters_ride_along_in_form() {
        let backend = HttpBackend::new("http://localhost:8093", None).unwrap();
        backend.set_parameter("timeout", "10s");
        backend.set_parameter("$r", "9");
        backend.unset_parameter("timeout");
        let form = backend.form("select $r");
        assert_eq!(
            form,
            vec![
                ("statement".to_string(), "select $r".to_string()),
                ("$r".to_string(), "9".to_string()),
            ]
        );
    }
}
