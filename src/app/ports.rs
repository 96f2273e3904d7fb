use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{RatingEvent, ReconciledTable};
use crate::error::Result;

/// How a write treats rows already in the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Clear the target, then insert
    Replace,
    /// Insert only
    Append,
}

/// Bookkeeping for one ETL run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub movie_count: usize,
    pub rating_count: usize,
}

// Load-side port
#[async_trait]
pub trait MovieSink: Send + Sync {
    /// Write the reconciled table, including its rating pivot columns.
    async fn write_movies(&self, table: &ReconciledTable, mode: WriteMode) -> Result<usize>;

    /// Write raw rating events as they appear in the log.
    async fn write_ratings(&self, events: &[RatingEvent], mode: WriteMode) -> Result<usize>;

    /// Record a finished run. Sinks without run bookkeeping ignore it.
    async fn record_run(&self, _run: &RunRecord) -> Result<()> {
        Ok(())
    }
}
