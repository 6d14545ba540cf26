//! Generic Query Executor
//!
//! Runs one statement with no schema knowledge and returns every cell as
//! text. A SQL NULL becomes [`NULL_SENTINEL`]; any present value, including
//! the empty string, is decoded unchanged. Backends plug in through the
//! two-operation [`RowSource`] trait.

pub mod buffered;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{BoxError, QueryError, QueryStage};

/// Text stored for a NULL cell.
pub const NULL_SENTINEL: &str = "NULLABLE";

/// One row as raw cell bytes; `None` marks a NULL.
pub type RawRow = Vec<Option<Vec<u8>>>;

/// Failure while producing the next row.
#[derive(Debug)]
pub struct RowError {
    pub stage: QueryStage,
    pub source: BoxError,
}

impl RowError {
    /// Advancing the cursor failed.
    pub fn next(source: impl Into<BoxError>) -> Self {
        Self {
            stage: QueryStage::Next,
            source: source.into(),
        }
    }

    /// Reading a cell of the current row failed.
    pub fn scan(source: impl Into<BoxError>) -> Self {
        Self {
            stage: QueryStage::Scan,
            source: source.into(),
        }
    }
}

/// Forward-only scan over an executed statement.
pub trait RowSource {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError>;

    /// Returns `Ok(None)` once the result set is exhausted.
    fn next_row(&mut self) -> Result<Option<RawRow>, RowError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in the first row.
    pub fn first_value(&self, column: &str) -> Option<&str> {
        self.rows.first()?.get(column).map(String::as_str)
    }
}

pub fn normalize_cell(cell: Option<&[u8]>) -> String {
    match cell {
        None => NULL_SENTINEL.to_string(),
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Drains `source` into a [`QueryResult`]. Any failure discards the rows
/// collected so far.
pub fn collect_rows<S: RowSource>(sql: &str, mut source: S) -> Result<QueryResult, QueryError> {
    let columns = source
        .column_names()
        .map_err(|e| QueryError::new(sql, QueryStage::Columns, e))?;

    let mut rows = Vec::new();
    loop {
        let raw = match source.next_row() {
            Ok(Some(raw)) => raw,
            Ok(None) => break,
            Err(e) => return Err(QueryError::new(sql, e.stage, e.source)),
        };
        if raw.len() != columns.len() {
            return Err(QueryError::new(
                sql,
                QueryStage::Scan,
                format!("row has {} cells, expected {}", raw.len(), columns.len()),
            ));
        }
        let row = columns
            .iter()
            .cloned()
            .zip(raw.iter().map(|cell| normalize_cell(cell.as_deref())))
            .collect();
        rows.push(row);
    }

    log::debug!("Query [{}] returned {} rows", sql, rows.len());
    Ok(QueryResult { columns, rows })
}
