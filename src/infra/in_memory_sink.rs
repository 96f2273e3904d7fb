use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::app::ports::{MovieSink, RunRecord, WriteMode};
use crate::domain::{RatingEvent, ReconciledTable};
use crate::error::Result;

/// In-memory sink for tests; remembers every write call
#[derive(Default)]
pub struct InMemorySink {
    movies: Mutex<Option<ReconciledTable>>,
    ratings: Mutex<Vec<RatingEvent>>,
    rating_writes: Mutex<Vec<(WriteMode, usize)>>,
    runs: Mutex<Vec<RunRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn movies(&self) -> Option<ReconciledTable> {
        self.movies.lock().await.clone()
    }

    pub async fn ratings(&self) -> Vec<RatingEvent> {
        self.ratings.lock().await.clone()
    }

    /// `(mode, rows)` of every `write_ratings` call in order
    pub async fn rating_writes(&self) -> Vec<(WriteMode, usize)> {
        self.rating_writes.lock().await.clone()
    }

    pub async fn runs(&self) -> Vec<RunRecord> {
        self.runs.lock().await.clone()
    }
}

#[async_trait]
impl MovieSink for InMemorySink {
    async fn write_movies(&self, table: &ReconciledTable, mode: WriteMode) -> Result<usize> {
        let mut movies = self.movies.lock().await;
        match (mode, movies.as_mut()) {
            (WriteMode::Append, Some(existing)) => existing.rows.extend(table.rows.iter().cloned()),
            _ => *movies = Some(table.clone()),
        }
        Ok(table.rows.len())
    }

    async fn write_ratings(&self, events: &[RatingEvent], mode: WriteMode) -> Result<usize> {
        let mut ratings = self.ratings.lock().await;
        if mode == WriteMode::Replace {
            ratings.clear();
        }
        ratings.extend_from_slice(events);
        self.rating_writes.lock().await.push((mode, events.len()));
        Ok(events.len())
    }

    async fn record_run(&self, run: &RunRecord) -> Result<()> {
        self.runs.lock().await.push(run.clone());
        Ok(())
    }
}
