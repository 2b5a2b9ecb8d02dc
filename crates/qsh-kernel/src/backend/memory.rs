//! In-memory backend with scripted responses.
//!
//! Records every statement and parameter it receives so tests can check what
//! would have gone over the wire.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use super::{BackendError, BackendResult, Connector, QueryBackend, RowCursor};

/// A cursor over rows held in memory.
pub struct VecCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Vec<u8>>>,
    current: Option<Vec<Vec<u8>>>,
    position: usize,
    fail_scan_at: Option<usize>,
    fail_close: bool,
    closed: bool,
    close_count: Option<Arc<AtomicUsize>>,
}

impl VecCursor {
    /// Cursor over raw rows, metadata rows included.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Vec<u8>>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            current: None,
            position: 0,
            fail_scan_at: None,
            fail_close: false,
            closed: false,
            close_count: None,
        }
    }

    /// Cursor for a successful response with the given result rows.
    ///
    /// Each result row holds one JSON value per column. Metadata and metrics
    /// rows are generated.
    pub fn response(columns: &[&str], results: Vec<Vec<JsonValue>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let width = columns.len().max(1);

        let signature: serde_json::Map<String, JsonValue> = columns
            .iter()
            .map(|c| (c.clone(), JsonValue::String("json".to_string())))
            .collect();
        let metadata = json!({
            "requestID": "00000000-0000-0000-0000-000000000000",
            "signature": signature,
            "status": "success",
        });
        let metrics = json!({ "resultCount": results.len() });

        let mut rows = Vec::with_capacity(results.len() + 2);
        rows.push(first_cell(&metadata, width));
        rows.push(first_cell(&metrics, width));
        for result in results {
            rows.push(result.iter().map(|v| v.to_string().into_bytes()).collect());
        }
        Self::new(columns, rows)
    }

    /// Fail `scan` on the given zero-based row.
    pub fn fail_scan_at(mut self, row: usize) -> Self {
        self.fail_scan_at = Some(row);
        self
    }

    /// Fail `close`.
    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Count `close` calls into a shared counter.
    pub fn count_closes(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.close_count = Some(counter);
        self
    }
}

fn first_cell(value: &JsonValue, width: usize) -> Vec<Vec<u8>> {
    let mut row = vec![Vec::new(); width];
    row[0] = value.to_string().into_bytes();
    row
}

#[async_trait]
impl RowCursor for VecCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn next(&mut self) -> BackendResult<bool> {
        if self.closed {
            return Err(BackendError::Closed);
        }
        if self.current.is_some() {
            self.position += 1;
        }
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> BackendResult<Vec<Vec<u8>>> {
        if self.fail_scan_at == Some(self.position) {
            return Err(BackendError::Scan(format!("row {} is unreadable", self.position)));
        }
        self.current.clone().ok_or(BackendError::Closed)
    }

    async fn close(&mut self) -> BackendResult<()> {
        self.closed = true;
        if let Some(counter) = &self.close_count {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_close {
            return Err(BackendError::Query("close failed".to_string()));
        }
        Ok(())
    }
}

/// Backend answering statements from a queue of scripted responses.
///
/// When the queue is empty, a statement gets an empty successful response.
#[derive(Default)]
pub struct MemoryBackend {
    endpoint: Mutex<String>,
    responses: Mutex<VecDeque<BackendResult<VecCursor>>>,
    statements: Mutex<Vec<String>>,
    params: Mutex<BTreeMap<String, String>>,
    closes: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the response for the next statement.
    pub fn push_response(&self, cursor: VecCursor) {
        lock(&self.responses).push_back(Ok(cursor));
    }

    /// Queue a failure for the next statement.
    pub fn push_error(&self, error: BackendError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Statements executed so far.
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }

    /// Current value of a mirrored parameter.
    pub fn parameter(&self, key: &str) -> Option<String> {
        lock(&self.params).get(key).cloned()
    }

    /// All mirrored parameters.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        lock(&self.params).clone()
    }

    /// Number of cursors closed.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl QueryBackend for MemoryBackend {
    fn endpoint(&self) -> String {
        lock(&self.endpoint).clone()
    }

    async fn execute(&self, statement: &str) -> BackendResult<Box<dyn RowCursor>> {
        lock(&self.statements).push(statement.to_string());
        let next = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(VecCursor::response(&["$1"], Vec::new())));
        let cursor = next?.count_closes(self.closes.clone());
        Ok(Box::new(cursor))
    }

    fn set_parameter(&self, key: &str, value: &str) {
        lock(&self.params).insert(key.to_string(), value.to_string());
    }

    fn unset_parameter(&self, key: &str) {
        lock(&self.params).remove(key);
    }
}

/// Connector that hands out one shared [`MemoryBackend`] for every endpoint.
pub struct MemoryConnector {
    backend: Arc<MemoryBackend>,
    connects: Mutex<Vec<String>>,
}

impl MemoryConnector {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self {
            backend,
            connects: Mutex::new(Vec::new()),
        }
    }

    /// Endpoints connected to, in order.
    pub fn connects(&self) -> Vec<String> {
        lock(&self.connects).clone()
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, endpoint: &str) -> BackendResult<Arc<dyn QueryBackend>> {
        if endpoint.trim().is_empty() {
            return Err(BackendError::InvalidEndpoint(endpoint.to_string()));
        }
        lock(&self.connects).push(endpoint.to_string());
        *lock(&self.backend.endpoint) = endpoint.to_string();
        Ok(self.backend.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_response_layout() {
        let mut cursor = VecCursor::response(&["$1"], vec![vec![json!(5)], vec![json!(7)]]);
        let mut rows = Vec::new();
        while cursor.next().await.unwrap() {
            rows.push(cursor.scan().unwrap());
        }
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2], vec![b"5".to_vec()]);
        assert_eq!(rows[3], vec![b"7".to_vec()]);
    }

    #[tokio::test]
    async fn test_scan_failure_position() {
        let mut cursor = VecCursor::response(&["a"], vec![vec![json!(1)]]).fail_scan_at(2);
        assert!(cursor.next().await.unwrap());
        assert!(cursor.scan().is_ok());
        assert!(cursor.next().await.unwrap());
        assert!(cursor.scan().is_ok());
        assert!(cursor.next().await.unwrap());
        assert!(matches!(cursor.scan(), Err(BackendError::Scan(_))));
    }

    #[tokio::test]
    async fn test_backend_records_and_counts_closes() {
        let backend = MemoryBackend::new();
        let mut cursor = backend.execute("select 1").await.unwrap();
        cursor.close().await.unwrap();
        assert_eq!(backend.statements(), vec!["select 1"]);
        assert_eq!(backend.closes(), 1);
    }

    #[tokio::test]
    async fn test_connector_shares_backend() {
        let backend = MemoryBackend::new();
        let connector = MemoryConnector::new(backend.clone());
        let conn = connector.connect("memory://a").unwrap();
        conn.set_parameter("timeout", "1s");
        assert_eq!(backend.parameter("timeout").as_deref(), Some("1s"));
        assert_eq!(backend.endpoint(), "memory://a");
        assert_eq!(connector.connects(), vec!["memory://a"]);
    }
}
