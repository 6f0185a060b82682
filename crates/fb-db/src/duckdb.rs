//! DuckDB series store implementation

use crate::error::{DbError, DbResult};
use crate::traits::{SeriesRows, SeriesStore, TableLayout};
use async_trait::async_trait;
use duckdb::{params, Connection};
use fb_core::{LongRecord, RawCell, Series, SeriesName, ValueType, WideTable};
use log::debug;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path, creating parent
    /// directories as needed
    pub fn from_path(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::ConnectionError(format!("{}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn load_wide_csv_sync(&self, path: &Path) -> DbResult<WideTable> {
        let csv_error = |message: String| DbError::CsvError {
            path: path.display().to_string(),
            message,
        };
        if !path.is_file() {
            return Err(csv_error("file does not exist".to_string()));
        }

        let escaped = path.display().to_string().replace('\'', "''");
        let sql = format!(
            "SELECT * FROM read_csv('{escaped}', all_varchar = true, header = true)"
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(|e| csv_error(e.to_string()))?;

        // Column metadata is only available after execution, so rows are
        // collected first.
        let rows: Vec<Vec<RawCell>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                (0..col_count)
                    .map(|i| row.get::<_, Option<String>>(i).map(RawCell::from_text))
                    .collect::<duckdb::Result<Vec<RawCell>>>()
            })
            .map_err(|e| csv_error(e.to_string()))?
            .collect::<Result<_, _>>()
            .map_err(|e| csv_error(e.to_string()))?;

        let headers: Vec<String> = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or(String::new(), |v| v.to_string()))
            .collect();

        debug!(
            "loaded {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            path.display()
        );

        Ok(WideTable {
            source: path.display().to_string(),
            headers,
            rows,
        })
    }

    fn read_series_sync(&self, name: &SeriesName) -> DbResult<Series> {
        let conn = self.lock()?;
        if !table_exists(&conn, name.as_str())? {
            return Err(DbError::TableNotFound(name.to_string()));
        }

        let sql = format!(
            "SELECT entity, CAST(year AS INTEGER), CAST(value AS DOUBLE) FROM {} ORDER BY entity, year",
            name.quoted()
        );
        let mut stmt = conn.prepare(&sql)?;
        let records: Vec<LongRecord> = stmt
            .query_map([], |row| {
                Ok(LongRecord {
                    entity: row.get(0)?,
                    year: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;

        let whole = records
            .iter()
            .filter_map(|r| r.value)
            .all(|v| v.fract() == 0.0);
        let value_type = if whole {
            ValueType::Integer
        } else {
            ValueType::Decimal
        };

        Ok(Series::new(name.clone(), value_type, None, records)?)
    }

    fn replace_series_sync(&self, name: &SeriesName, rows: SeriesRows<'_>) -> DbResult<usize> {
        let conn = self.lock()?;
        let layout = rows.layout();

        let written = transaction(&conn, |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                name.quoted(),
                layout.ddl()
            ))?;
            verify_layout(conn, name.as_str(), layout)?;
            conn.execute_batch(&format!("DELETE FROM {}", name.quoted()))?;

            let mut appender = conn.appender(name.as_str())?;
            match rows {
                SeriesRows::Long(series) => {
                    for r in series.records() {
                        appender.append_row(params![r.entity, r.year, r.value])?;
                    }
                }
                SeriesRows::Adjusted(adjusted) => {
                    for r in &adjusted.records {
                        appender.append_row(params![
                            r.entity,
                            r.year,
                            r.adjusted_value,
                            r.original_value,
                            r.index_factor
                        ])?;
                    }
                }
            }
            appender.flush()?;
            Ok(rows.len())
        })?;

        debug!("replaced {} with {} rows", name, written);
        Ok(written)
    }

    fn list_series_sync(&self) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Run `body` inside a transaction, committing on success and rolling back
/// on any error.
fn transaction<T, F>(conn: &Connection, body: F) -> DbResult<T>
where
    F: FnOnce(&Connection) -> DbResult<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::TransactionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'main' AND table_name = ?",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fail with [`DbError::SchemaMismatch`] unless `table` has exactly the
/// columns of `layout`.
fn verify_layout(conn: &Connection, table: &str, layout: TableLayout) -> DbResult<()> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_schema = 'main' AND table_name = ? ORDER BY ordinal_position",
    )?;
    let found: Vec<(String, String)> = stmt
        .query_map(params![table], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<_, _>>()?;

    let expected = layout.columns();
    let matches = found.len() == expected.len()
        && found
            .iter()
            .zip(expected)
            .all(|((name, ty), (exp_name, exp_ty))| name == *exp_name && ty == *exp_ty);

    if matches {
        return Ok(());
    }

    let describe = |cols: Vec<String>| cols.join(", ");
    Err(DbError::SchemaMismatch {
        table: table.to_string(),
        expected: describe(expected.iter().map(|(n, t)| format!("{n} {t}")).collect()),
        found: describe(found.iter().map(|(n, t)| format!("{n} {t}")).collect()),
    })
}

#[async_trait]
impl SeriesStore for DuckDbBackend {
    async fn load_wide_csv(&self, path: &Path) -> DbResult<WideTable> {
        self.load_wide_csv_sync(path)
    }

    async fn read_series(&self, name: &SeriesName) -> DbResult<Series> {
        self.read_series_sync(name)
    }

    async fn replace_series(&self, name: &SeriesName, rows: SeriesRows<'_>) -> DbResult<usize> {
        self.replace_series_sync(name, rows)
    }

    async fn series_exists(&self, name: &SeriesName) -> DbResult<bool> {
        let conn = self.lock()?;
        table_exists(&conn, name.as_str())
    }

    async fn list_series(&self) -> DbResult<Vec<String>> {
        self.list_series_sync()
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
