//! Chunked bulk loader.
//!
//! Rows are sent to a [`BulkInsert`] sink in fixed-size batches, one request
//! per batch, strictly in order. A batch the sink refuses is logged and
//! dropped; the loader itself never fails. Callers read the outcome to learn
//! which rows made it in.

use rusqlite::types::Value;
use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub type SqlRow = Vec<Value>;

/// A row handed back by the sink, including generated columns such as `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertedRow {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.int("id")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// The batch itself was bad (constraint violation, malformed value).
    Rejected(String),
    /// The store is unusable (missing table, I/O failure, locked file).
    Fatal(String),
}

impl BatchError {
    pub fn message(&self) -> &str {
        match self {
            BatchError::Rejected(m) | BatchError::Fatal(m) => m,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchError::Fatal(_))
    }
}

pub trait BulkInsert {
    /// Insert every row of one batch and return the stored rows.
    fn insert_batch(
        &mut self,
        table: &TableSpec,
        rows: &[SqlRow],
    ) -> Result<Vec<InsertedRow>, BatchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    pub table: &'static str,
    pub chunk_index: usize,
    pub row_count: usize,
    pub first_row: String,
    pub message: String,
    pub fatal: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Complete(Vec<InsertedRow>),
    Partial {
        rows: Vec<InsertedRow>,
        failures: Vec<ChunkFailure>,
    },
}

impl LoadOutcome {
    pub fn rows(&self) -> &[InsertedRow] {
        match self {
            LoadOutcome::Complete(rows) => rows,
            LoadOutcome::Partial { rows, .. } => rows,
        }
    }

    pub fn failures(&self) -> &[ChunkFailure] {
        match self {
            LoadOutcome::Complete(_) => &[],
            LoadOutcome::Partial { failures, .. } => failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, LoadOutcome::Complete(_))
    }

    pub fn dropped_rows(&self) -> usize {
        self.failures().iter().map(|f| f.row_count).sum()
    }

    pub fn has_fatal(&self) -> bool {
        self.failures().iter().any(|f| f.fatal)
    }
}

pub fn insert_in_chunks<S>(
    sink: &mut S,
    table: &TableSpec,
    rows: &[SqlRow],
    chunk_size: usize,
) -> LoadOutcome
where
    S: BulkInsert + ?Sized,
{
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };

    let mut inserted: Vec<InsertedRow> = Vec::with_capacity(rows.len());
    let mut failures: Vec<ChunkFailure> = Vec::new();

    for (chunk_index, chunk) in rows.chunks(chunk_size).enumerate() {
        match sink.insert_batch(table, chunk) {
            Ok(mut stored) => inserted.append(&mut stored),
            Err(e) => {
                let first_row = render_row(table, &chunk[0]);
                warn!(
                    table = table.name,
                    chunk = chunk_index,
                    rows = chunk.len(),
                    fatal = e.is_fatal(),
                    first_row = %first_row,
                    error = %e.message(),
                    "batch insert failed; dropping chunk"
                );
                failures.push(ChunkFailure {
                    table: table.name,
                    chunk_index,
                    row_count: chunk.len(),
                    first_row,
                    message: e.message().to_string(),
                    fatal: e.is_fatal(),
                });
            }
        }
    }

    info!(
        table = table.name,
        attempted = rows.len(),
        inserted = inserted.len(),
        failed_chunks = failures.len(),
        "bulk insert finished"
    );

    if failures.is_empty() {
        LoadOutcome::Complete(inserted)
    } else {
        LoadOutcome::Partial {
            rows: inserted,
            failures,
        }
    }
}

/// JSON rendering of one row, keyed by column, for log lines and reports.
pub fn render_row(table: &TableSpec, row: &SqlRow) -> String {
    let mut obj = serde_json::Map::new();
    for (col, v) in table.columns.iter().zip(row.iter()) {
        let jv = match v {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::json!(i),
            Value::Real(f) => serde_json::json!(f),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Blob(b) => serde_json::json!(format!("<{} bytes>", b.len())),
        };
        obj.insert((*col).to_string(), jv);
    }
    serde_json::Value::Object(obj).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: TableSpec = TableSpec {
        name: "pairs",
        columns: &["name", "score"],
    };

    #[test]
    fn inserted_row_accessors() {
        let row = InsertedRow::new(
            vec!["id".into(), "name".into(), "score".into()],
            vec![Value::Integer(4), Value::Text("x".into()), Value::Real(1.5)],
        );
        assert_eq!(row.id(), Some(4));
        assert_eq!(row.text("name"), Some("x"));
        assert_eq!(row.int("score"), None);
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn render_row_uses_column_names() {
        let rendered = render_row(&PAIRS, &vec![Value::Text("a".into()), Value::Null]);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("json");
        assert_eq!(parsed["name"], "a");
        assert!(parsed["score"].is_null());
    }

    struct Refuser;

    impl BulkInsert for Refuser {
        fn insert_batch(
            &mut self,
            _table: &TableSpec,
            _rows: &[SqlRow],
        ) -> Result<Vec<InsertedRow>, BatchError> {
            Err(BatchError::Rejected("UNIQUE constraint failed".into()))
        }
    }

    #[test]
    fn zero_chunk_size_falls_back_to_default() {
        let rows: Vec<SqlRow> = (0..120)
            .map(|i| vec![Value::Text(format!("p{i}")), Value::Integer(i)])
            .collect();
        let outcome = insert_in_chunks(&mut Refuser, &PAIRS, &rows, 0);
        assert_eq!(outcome.failures().len(), 3);
        assert_eq!(outcome.dropped_rows(), 120);
        assert!(!outcome.has_fatal());
        assert!(outcome.failures()[0].first_row.contains("\"p0\""));
        assert!(outcome.failures()[2].first_row.contains("\"p100\""));
    }

    #[test]
    fn empty_input_is_complete() {
        let outcome = insert_in_chunks(&mut Refuser, &PAIRS, &[], 50);
        assert!(outcome.is_complete());
        assert!(outcome.rows().is_empty());
    }
}
