//! Row source over rows already fetched by `sqlx`.
//!
//! Statements go through `sqlx::raw_sql`, i.e. the text protocol, so every
//! non-NULL cell can be read back as its raw bytes regardless of column type.

use sqlx::mysql::MySqlPool;
use sqlx::sqlite::SqlitePool;
use sqlx::{Column, ColumnIndex, Decode, Executor, Row, ValueRef};

use super::{collect_rows, QueryResult, RawRow, RowError, RowSource};
use crate::error::{BoxError, QueryError, QueryStage};

pub struct BufferedRowSource<R> {
    columns: Vec<String>,
    rows: std::vec::IntoIter<R>,
}

impl<R: Row> BufferedRowSource<R> {
    pub fn new(columns: Vec<String>, rows: Vec<R>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl<R> RowSource for BufferedRowSource<R>
where
    R: Row,
    usize: ColumnIndex<R>,
    for<'r> &'r [u8]: Decode<'r, R::Database>,
{
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<RawRow>, RowError> {
        let Some(row) = self.rows.next() else {
            return Ok(None);
        };

        let mut raw = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            let value = row.try_get_raw(idx).map_err(RowError::scan)?;
            if value.is_null() {
                raw.push(None);
                continue;
            }
            let bytes = <&[u8] as Decode<R::Database>>::decode(value).map_err(RowError::scan)?;
            raw.push(Some(bytes.to_vec()));
        }
        Ok(Some(raw))
    }
}

fn row_columns<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Runs `sql` against the MySQL/TiDB pool.
pub async fn query_mysql(pool: &MySqlPool, sql: &str) -> Result<QueryResult, QueryError> {
    let rows = sqlx::raw_sql(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::new(sql, QueryStage::Execute, e))?;

    let columns = match rows.first() {
        Some(row) => row_columns(row),
        None => pool
            .describe(sql)
            .await
            .map(|d| d.columns().iter().map(|c| c.name().to_string()).collect())
            .map_err(|e| QueryError::new(sql, QueryStage::Columns, e))?,
    };
    collect_rows(sql, BufferedRowSource::new(columns, rows))
}

/// Runs `sql` against the SQLite pool.
pub async fn query_sqlite(pool: &SqlitePool, sql: &str) -> Result<QueryResult, QueryError> {
    let rows = sqlx::raw_sql(sql)
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::new(sql, QueryStage::Execute, e))?;

    let columns = match rows.first() {
        Some(row) => row_columns(row),
        None => pool
            .describe(sql)
            .await
            .map(|d| d.columns().iter().map(|c| c.name().to_string()).collect())
            .map_err(|e| QueryError::new(sql, QueryStage::Columns, e))?,
    };
    collect_rows(sql, BufferedRowSource::new(columns, rows))
}
