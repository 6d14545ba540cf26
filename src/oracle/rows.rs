/// Row source over an Oracle result set
///
/// Binary columns (RAW, LONG RAW, BLOB) are read as bytes; everything else
/// is fetched through the driver's text conversion, so numbers and dates
/// come back exactly as Oracle renders them.

use oracle::sql_type::OracleType;
use oracle::{Connection, ResultSet, Row};

use crate::error::{BoxError, QueryError, QueryStage};
use crate::query::{collect_rows, QueryResult, RawRow, RowError, RowSource};

pub struct OracleRowSource<'conn> {
    rows: ResultSet<'conn, Row>,
    columns: Vec<String>,
    binary: Vec<bool>,
}

impl<'conn> OracleRowSource<'conn> {
    pub fn open(conn: &'conn Connection, sql: &str) -> Result<Self, oracle::Error> {
        let rows = conn.query(sql, &[])?;
        let (columns, binary): (Vec<String>, Vec<bool>) = rows
            .column_info()
            .iter()
            .map(|info| (info.name().to_string(), is_binary(info.oracle_type())))
            .unzip();
        Ok(Self {
            rows,
            columns,
            binary,
        })
    }
}

fn is_binary(oracle_type: &OracleType) -> bool {
    matches!(
        oracle_type,
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB
    )
}

impl RowSource for OracleRowSource<'_> {
    fn column_names(&mut self) -> Result<Vec<String>, BoxError> {
        Ok(self.columns.clone())
    }

    fn next_row(&mut self) -> Result<Option<RawRow>, RowError> {
        let row = match self.rows.next() {
            None => return Ok(None),
            Some(row) => row.map_err(RowError::next)?,
        };

        let mut raw = Vec::with_capacity(self.binary.len());
        for (idx, binary) in self.binary.iter().enumerate() {
            let cell = if *binary {
                row.get::<usize, Option<Vec<u8>>>(idx)
            } else {
                row.get::<usize, Option<String>>(idx)
                    .map(|v| v.map(String::into_bytes))
            };
            raw.push(cell.map_err(RowError::scan)?);
        }
        Ok(Some(raw))
    }
}

/// Runs `sql` on an open session and collects every row.
pub fn query_connection(conn: &Connection, sql: &str) -> Result<QueryResult, QueryError> {
    let source = OracleRowSource::open(conn, sql)
        .map_err(|e| QueryError::new(sql, QueryStage::Execute, e))?;
    collect_rows(sql, source)
}
