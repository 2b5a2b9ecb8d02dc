//! Query backend traits.
//!
//! Statements are handed to a [`QueryBackend`], which answers with a
//! [`RowCursor`]. The cursor carries the whole response as rows of
//! JSON-encoded cells:
//!
//! ```text
//! row 0    metadata: {requestID, signature, status}
//! row 1    metrics
//! row 2..  one row per result
//! ```
//!
//! Two implementations are provided:
//!
//! - `HttpBackend`: the query service REST endpoint, over reqwest
//! - `MemoryBackend`: scripted responses, for tests and offline use

mod http;
mod memory;

pub use http::{HttpBackend, HttpConnector};
pub use memory::{MemoryBackend, MemoryConnector, VecCursor};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend operation errors.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Query(String),
    #[error("cannot read row: {0}")]
    Scan(String),
    #[error("cursor is closed")]
    Closed,
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            BackendError::Connect(err.to_string())
        } else {
            BackendError::Query(err.to_string())
        }
    }
}

/// A forward-only cursor over one statement's response.
#[async_trait]
pub trait RowCursor: Send {
    /// Column names, known before the first row.
    fn columns(&self) -> &[String];

    /// Advance to the next row. Returns false once the rows run out.
    async fn next(&mut self) -> BackendResult<bool>;

    /// Cells of the current row, one per column.
    ///
    /// Each cell is a JSON fragment; an empty cell means the column has no
    /// value in this row.
    fn scan(&mut self) -> BackendResult<Vec<Vec<u8>>>;

    /// Release the cursor. Must be called once reading stops.
    async fn close(&mut self) -> BackendResult<()>;
}

/// A connection to a query service.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// URL this backend talks to.
    fn endpoint(&self) -> String;

    /// Run a statement.
    async fn execute(&self, statement: &str) -> BackendResult<Box<dyn RowCursor>>;

    /// Set a request parameter sent with every following statement.
    fn set_parameter(&self, key: &str, value: &str);

    /// Stop sending a request parameter.
    fn unset_parameter(&self, key: &str);
}

/// Builds backends for `\CONNECT`.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &str) -> BackendResult<Arc<dyn QueryBackend>>;
}
