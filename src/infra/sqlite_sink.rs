use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::app::ports::{MovieSink, RunRecord, WriteMode};
use crate::constants::{MOVIES_TABLE, RATINGS_TABLE, RUNS_TABLE};
use crate::domain::{RatingEvent, ReconciledTable};
use crate::error::{EtlError, Result};
use crate::pipeline::processing::schema::{Cell, OUTPUT_COLUMNS};

/// SQLite-backed sink: `movies`, `ratings` and `etl_runs` tables
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {ratings} (
                user_id    INTEGER NOT NULL,
                movie_id   INTEGER NOT NULL,
                rating     REAL NOT NULL,
                timestamp  INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {runs} (
                run_id        TEXT PRIMARY KEY,
                started_at    TEXT NOT NULL,
                finished_at   TEXT NOT NULL,
                movie_count   INTEGER NOT NULL,
                rating_count  INTEGER NOT NULL
            );
            "#,
            ratings = RATINGS_TABLE,
            runs = RUNS_TABLE,
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EtlError::Sink("sqlite connection lock poisoned".to_string()))
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Column names of `table` in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        columns_of(&conn, table)
    }
}

fn columns_of(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// An appended batch may carry rating values the existing table lacks.
fn add_missing_rating_columns(conn: &Connection, table: &ReconciledTable) -> Result<()> {
    let existing = columns_of(conn, MOVIES_TABLE)?;
    for value in &table.rating_columns {
        let name = value.column_name();
        if !existing.contains(&name) {
            debug!("Adding column {} to {}", name, MOVIES_TABLE);
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} INTEGER NOT NULL DEFAULT 0",
                MOVIES_TABLE,
                quote_ident(&name)
            ))?;
        }
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(cell: Cell) -> SqlValue {
    match cell {
        Cell::Null => SqlValue::Null,
        Cell::Integer(i) => SqlValue::Integer(i),
        Cell::Real(f) => SqlValue::Real(f),
        Cell::Text(s) => SqlValue::Text(s),
    }
}

fn movie_table_ddl(table: &ReconciledTable, if_not_exists: bool) -> String {
    let mut columns: Vec<String> = OUTPUT_COLUMNS
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name), c.sql_type.as_sql()))
        .collect();
    columns.extend(
        table
            .rating_columns
            .iter()
            .map(|v| format!("{} INTEGER NOT NULL DEFAULT 0", quote_ident(&v.column_name()))),
    );
    format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        MOVIES_TABLE,
        columns.join(", ")
    )
}

#[async_trait]
impl MovieSink for SqliteSink {
    async fn write_movies(&self, table: &ReconciledTable, mode: WriteMode) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        match mode {
            WriteMode::Replace => {
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", MOVIES_TABLE))?;
                tx.execute_batch(&movie_table_ddl(table, false))?;
            }
            WriteMode::Append => {
                tx.execute_batch(&movie_table_ddl(table, true))?;
                add_missing_rating_columns(&tx, table)?;
            }
        }

        let names: Vec<String> = OUTPUT_COLUMNS
            .iter()
            .map(|c| c.name.to_string())
            .chain(table.rating_columns.iter().map(|v| v.column_name()))
            .collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            MOVIES_TABLE,
            names.iter().map(|n| quote_ident(n)).collect::<Vec<_>>().join(", "),
            placeholders.join(", ")
        );

        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &table.rows {
                let mut values: Vec<SqlValue> = row.cells().into_iter().map(to_sql_value).collect();
                values.extend(table.rating_columns.iter().map(|v| {
                    SqlValue::Integer(row.rating_counts.get(v).copied().unwrap_or(0) as i64)
                }));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;

        debug!("Wrote {} movies ({:?})", table.rows.len(), mode);
        Ok(table.rows.len())
    }

    async fn write_ratings(&self, events: &[RatingEvent], mode: WriteMode) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if mode == WriteMode::Replace {
            tx.execute(&format!("DELETE FROM {}", RATINGS_TABLE), [])?;
        }
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (user_id, movie_id, rating, timestamp) VALUES (?1, ?2, ?3, ?4)",
                RATINGS_TABLE
            ))?;
            for event in events {
                stmt.execute(params![event.user_id, event.movie_id, event.rating, event.timestamp])?;
            }
        }
        tx.commit()?;

        Ok(events.len())
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (run_id, started_at, finished_at, movie_count, rating_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                RUNS_TABLE
            ),
            params![
                run.run_id.to_string(),
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339(),
                run.movie_count as i64,
                run.rating_count as i64
            ],
        )?;
        Ok(())
    }
}
