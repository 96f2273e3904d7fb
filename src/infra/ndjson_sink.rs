use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::app::ports::{MovieSink, RunRecord, WriteMode};
use crate::domain::{RatingEvent, ReconciledRow, ReconciledTable};
use crate::error::Result;
use crate::pipeline::processing::schema::{output_column_names, Cell};

pub const MOVIES_FILE: &str = "movies.ndjson";
pub const RATINGS_FILE: &str = "ratings.ndjson";
pub const RUNS_FILE: &str = "runs.ndjson";

/// Writes one JSON object per line into a directory
pub struct NdjsonSink {
    pub output_dir: PathBuf,
}

impl NdjsonSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    async fn write_lines(&self, file_name: &str, lines: String, mode: WriteMode) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.path_for(file_name);

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Replace => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        let mut file = options.open(&path).await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        debug!("Wrote {} bytes to {}", lines.len(), path.display());
        Ok(())
    }
}

fn cell_to_json(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Integer(i) => Value::from(i),
        Cell::Real(f) => Value::from(f),
        Cell::Text(s) => Value::String(s),
    }
}

/// Flat JSON object: output columns then one `rating_<v>` key per pivot column
pub fn movie_to_json(row: &ReconciledRow, table: &ReconciledTable) -> Value {
    let mut object: Map<String, Value> = output_column_names()
        .zip(row.cells())
        .map(|(name, cell)| (name.to_string(), cell_to_json(cell)))
        .collect();
    for value in &table.rating_columns {
        let count = row.rating_counts.get(value).copied().unwrap_or(0);
        object.insert(value.column_name(), Value::from(count));
    }
    Value::Object(object)
}

/// The rating event as read, plus `rated_at` in RFC 3339 (null if out of range)
pub fn rating_to_json(event: &RatingEvent) -> Result<Value> {
    let mut value = serde_json::to_value(event)?;
    if let Value::Object(object) = &mut value {
        let rated_at = event
            .rated_at()
            .map_or(Value::Null, |at| Value::String(at.to_rfc3339()));
        object.insert("rated_at".to_string(), rated_at);
    }
    Ok(value)
}

fn to_lines<T, F>(items: &[T], to_json: F) -> Result<String>
where
    F: Fn(&T) -> Result<String>,
{
    let mut buf = String::new();
    for item in items {
        buf.push_str(&to_json(item)?);
        buf.push('\n');
    }
    Ok(buf)
}

#[async_trait]
impl MovieSink for NdjsonSink {
    async fn write_movies(&self, table: &ReconciledTable, mode: WriteMode) -> Result<usize> {
        let lines = to_lines(&table.rows, |row| {
            Ok(serde_json::to_string(&movie_to_json(row, table))?)
        })?;
        self.write_lines(MOVIES_FILE, lines, mode).await?;
        Ok(table.rows.len())
    }

    async fn write_ratings(&self, events: &[RatingEvent], mode: WriteMode) -> Result<usize> {
        let lines = to_lines(events, |event| {
            Ok(serde_json::to_string(&rating_to_json(event)?)?)
        })?;
        self.write_lines(RATINGS_FILE, lines, mode).await?;
        Ok(events.len())
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        let line = format!("{}\n", serde_json::to_string(run)?);
        self.write_lines(RUNS_FILE, line, WriteMode::Append).await
    }
}
