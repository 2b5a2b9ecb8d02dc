//! Result stream reconstruction.
//!
//! Turns a [`RowCursor`] back into the query service's response envelope,
//! writing it to a sink as rows arrive:
//!
//! ```text
//! {
//!     "requestID": ...,            ◀── row 0 (metadata)
//!     "signature": ...,            ◀── row 0
//!     "results": [
//!         ...                      ◀── rows 2.. (one value each)
//!     ],
//!     "status": ...,               ◀── row 0, held until the end
//!     "metrics": ...               ◀── row 1, held until the end
//! }
//! ```
//!
//! Single-column rows are unwrapped to the bare column value. The cursor is
//! closed on every path out. When reading fails after the envelope has been
//! opened, [`TRUNCATION_MARKER`] follows the partial output.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::backend::RowCursor;
use crate::error::{ShellError, ShellResult};

/// Written after a partial envelope when reading the cursor failed.
pub const TRUNCATION_MARKER: &str = "\n<<< output truncated >>>\n";

const INDENT: &[u8] = b"    ";
const ROW_INDENT: &str = "        ";

/// Formatting options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeOptions {
    /// Pretty-print each result value and the metadata values.
    pub pretty: bool,
}

/// What was written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeSummary {
    /// Number of result values emitted.
    pub results: usize,
    /// The `status` field, when present.
    pub status: Option<String>,
}

/// Stream a cursor's rows to `sink` as a response envelope.
pub async fn reconstruct(
    mut cursor: Box<dyn RowCursor>,
    sink: &mut dyn Write,
    options: EnvelopeOptions,
) -> ShellResult<EnvelopeSummary> {
    let mut out = EnvelopeWriter::new(sink, options);

    let streamed = copy_rows(&mut *cursor, &mut out).await;
    let closed = cursor.close().await;
    let close_failure = closed.as_ref().err().map(ToString::to_string);

    let result = match (streamed, closed) {
        (Ok(state), Ok(())) => {
            out.finish(&state);
            Ok(state)
        }
        (Ok(_), Err(close_err)) => Err(ShellError::BackendQuery(close_err)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::error!(error = %close_err, "cursor close failed after read error");
            Err(e)
        }
    };

    if let Some(write_err) = out.take_write_error() {
        // BackendQuery here is the close failure, carried separately.
        let read_failure = match &result {
            Err(ShellError::BackendQuery(_)) | Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        return Err(write_failure(write_err, read_failure, close_failure));
    }

    match result {
        Ok(state) => Ok(EnvelopeSummary {
            results: state.results,
            status: state.status.as_ref().and_then(|s| s.as_str()).map(str::to_string),
        }),
        Err(e) => {
            if out.opened {
                out.write(TRUNCATION_MARKER);
            }
            Err(e)
        }
    }
}

/// The write error, carrying any read or close failure it displaced.
fn write_failure(
    write_err: std::io::Error,
    read_failure: Option<String>,
    close_failure: Option<String>,
) -> ShellError {
    if let Some(read) = &read_failure {
        tracing::error!(error = %read, "read failure displaced by write failure");
    }
    if let Some(close) = &close_failure {
        tracing::error!(error = %close, "cursor close failed after write failure");
    }

    let displaced: Vec<String> = read_failure
        .into_iter()
        .chain(close_failure.map(|close| format!("cursor close failed: {close}")))
        .collect();
    if displaced.is_empty() {
        return ShellError::OutputWrite(write_err);
    }
    let message = format!("{write_err}; {}", displaced.join("; "));
    ShellError::OutputWrite(std::io::Error::new(write_err.kind(), message))
}

/// Values held back until the results array is closed.
#[derive(Debug, Default)]
struct StreamState {
    status: Option<JsonValue>,
    metrics: Option<JsonValue>,
    results: usize,
}

async fn copy_rows(cursor: &mut dyn RowCursor, out: &mut EnvelopeWriter<'_>) -> ShellResult<StreamState> {
    let columns = cursor.columns().to_vec();
    let mut state = StreamState::default();
    let mut index = 0usize;

    while cursor.next().await.map_err(|e| ShellError::ResultScan(e.to_string()))? {
        let cells = cursor.scan().map_err(|e| ShellError::ResultScan(e.to_string()))?;
        let merged = merge_row(&columns, &cells)?;

        match index {
            0 => {
                let mut metadata = metadata_object(merged);
                out.open(metadata.get("requestID"), metadata.get("signature"));
                state.status = metadata.remove("status");
            }
            1 => {
                let metrics = metadata_object(merged);
                if !metrics.is_empty() {
                    state.metrics = Some(JsonValue::Object(metrics));
                }
            }
            _ => {
                if !out.opened {
                    out.open(None, None);
                }
                let value = if columns.len() == 1 {
                    merged.into_iter().next().map_or(JsonValue::Null, |(_, v)| v)
                } else {
                    JsonValue::Object(merged)
                };
                out.result(&value, state.results == 0);
                state.results += 1;
            }
        }
        index += 1;

        if out.failed() {
            break;
        }
    }

    Ok(state)
}

/// Merge a row's cells into one object keyed by column name.
///
/// Empty cells are skipped, except that a lone column keeps its key with a
/// `null` value so single-column rows always unwrap to something.
fn merge_row(columns: &[String], cells: &[Vec<u8>]) -> ShellResult<Map<String, JsonValue>> {
    let mut merged = Map::new();
    for (column, cell) in columns.iter().zip(cells) {
        if cell.is_empty() {
            continue;
        }
        let value: JsonValue = serde_json::from_slice(cell).map_err(|e| {
            ShellError::ResultScan(format!("column {column}: malformed JSON: {e}"))
        })?;
        merged.insert(column.clone(), value);
    }
    if merged.is_empty() && columns.len() == 1 {
        merged.insert(columns[0].clone(), JsonValue::Null);
    }
    Ok(merged)
}

/// Pull the metadata object out of a merged row.
///
/// Backends either spread the fields across columns (then the merged row is
/// the object) or pack the object into the first column.
fn metadata_object(mut merged: Map<String, JsonValue>) -> Map<String, JsonValue> {
    if merged.contains_key("requestID") || merged.contains_key("status") {
        return merged;
    }
    let first_key = merged.keys().next().cloned();
    match first_key.and_then(|k| merged.remove(&k)) {
        Some(JsonValue::Object(inner)) => inner,
        Some(JsonValue::Null) | None => Map::new(),
        Some(other) => {
            let mut wrapped = Map::new();
            wrapped.insert("value".to_string(), other);
            wrapped
        }
    }
}

/// Writes envelope text, remembering the first write failure.
///
/// After a failure every further write is skipped.
struct EnvelopeWriter<'a> {
    sink: &'a mut dyn Write,
    options: EnvelopeOptions,
    opened: bool,
    error: Option<std::io::Error>,
}

impl<'a> EnvelopeWriter<'a> {
    fn new(sink: &'a mut dyn Write, options: EnvelopeOptions) -> Self {
        Self {
            sink,
            options,
            opened: false,
            error: None,
        }
    }

    fn write(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.sink.write_all(text.as_bytes()) {
            self.error = Some(e);
        }
    }

    fn failed(&self) -> bool {
        self.error.is_some()
    }

    fn take_write_error(&mut self) -> Option<std::io::Error> {
        if let Err(e) = self.sink.flush() {
            self.error.get_or_insert(e);
        }
        self.error.take()
    }

    fn open(&mut self, request_id: Option<&JsonValue>, signature: Option<&JsonValue>) {
        self.opened = true;
        let request_id = self.fragment(request_id.unwrap_or(&JsonValue::Null), "    ");
        let signature = self.fragment(signature.unwrap_or(&JsonValue::Null), "    ");
        self.write(&format!(
            "{{\n    \"requestID\": {request_id},\n    \"signature\": {signature},\n    \"results\": ["
        ));
    }

    fn result(&mut self, value: &JsonValue, first: bool) {
        let text = self.fragment(value, ROW_INDENT);
        let separator = if first { "\n" } else { ",\n" };
        self.write(&format!("{separator}{ROW_INDENT}{text}"));
    }

    fn finish(&mut self, state: &StreamState) {
        if !self.opened {
            self.open(None, None);
        }
        let closing = if state.results == 0 { "],\n" } else { "\n    ],\n" };
        self.write(closing);

        let status = self.fragment(state.status.as_ref().unwrap_or(&JsonValue::Null), "    ");
        match &state.metrics {
            Some(metrics) => {
                let metrics = self.fragment(metrics, "    ");
                self.write(&format!("    \"status\": {status},\n    \"metrics\": {metrics}\n}}\n"));
            }
            None => self.write(&format!("    \"status\": {status}\n}}\n")),
        }
    }

    /// Serialize one value, indenting continuation lines by `indent` when
    /// pretty-printing.
    fn fragment(&self, value: &JsonValue, indent: &str) -> String {
        if !self.options.pretty {
            return value.to_string();
        }
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        if value.serialize(&mut serializer).is_err() {
            return value.to_string();
        }
        String::from_utf8_lossy(&buf).replace('\n', &format!("\n{indent}"))
    }
}
