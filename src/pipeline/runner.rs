use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::app::ports::{MovieSink, RunRecord, WriteMode};
use crate::config::Config;
use crate::domain::{RatingEvent, ReconcileStats};
use crate::error::Result;
use crate::metrics::LoadMetrics;
use crate::pipeline::reconcile::{reconcile, ReconcileOptions};
use crate::pipeline::sources;

/// What one ETL run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub movies_written: usize,
    pub ratings_written: usize,
    pub rating_chunks: usize,
    pub stats: ReconcileStats,
}

/// Load all sources, reconcile them, replace the movie table and reload the
/// rating log in chunks.
///
/// Every source is read before anything is written, so a load failure
/// leaves the sink untouched.
pub async fn run_etl(config: &Config, sink: Arc<dyn MovieSink>) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!("Starting ETL run {}", run_id);

    let raw_records = sources::load_wiki_records(&config.sources.wiki_path)?;
    let metadata = sources::load_metadata(&config.sources.metadata_path)?;
    let ratings = sources::load_ratings(&config.sources.ratings_path)?;

    let table = reconcile(raw_records, metadata, &ratings, &ReconcileOptions::from(config))?;

    let movies_written = sink.write_movies(&table, WriteMode::Replace).await?;
    LoadMetrics::record_movies_written(movies_written);
    info!("Wrote {} reconciled movies", movies_written);

    let (ratings_written, rating_chunks) =
        write_ratings_chunked(sink.as_ref(), &ratings, config.pipeline.chunk_size).await?;

    sink.record_run(&RunRecord {
        run_id,
        started_at,
        finished_at: Utc::now(),
        movie_count: movies_written,
        rating_count: ratings_written,
    })
    .await?;

    info!(
        "ETL run {} finished: {} movies, {} ratings in {} chunks",
        run_id, movies_written, ratings_written, rating_chunks
    );

    Ok(RunSummary {
        run_id,
        movies_written,
        ratings_written,
        rating_chunks,
        stats: table.stats,
    })
}

/// Write the rating log `chunk_size` events at a time. The first chunk
/// replaces the stored log and later chunks append, so an empty log still
/// clears it. Returns `(rows written, chunks written)`.
pub async fn write_ratings_chunked(
    sink: &dyn MovieSink,
    events: &[RatingEvent],
    chunk_size: usize,
) -> Result<(usize, usize)> {
    let started = Instant::now();
    let chunk_size = chunk_size.max(1);

    if events.is_empty() {
        sink.write_ratings(&[], WriteMode::Replace).await?;
        return Ok((0, 0));
    }

    let mut rows_imported = 0;
    let mut chunks = 0;
    for chunk in events.chunks(chunk_size) {
        let mode = if chunks == 0 {
            WriteMode::Replace
        } else {
            WriteMode::Append
        };
        let chunk_started = Instant::now();
        let written = sink.write_ratings(chunk, mode).await?;
        LoadMetrics::record_rating_chunk(written, chunk_started.elapsed().as_secs_f64());

        info!(
            "importing rows {} to {}... Done. {:.2} total seconds elapsed",
            rows_imported,
            rows_imported + chunk.len(),
            started.elapsed().as_secs_f64()
        );
        rows_imported += written;
        chunks += 1;
    }

    Ok((rows_imported, chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySink;

    fn events(n: i64) -> Vec<RatingEvent> {
        (0..n)
            .map(|i| RatingEvent {
                user_id: i,
                movie_id: i % 4,
                rating: 3.0,
                timestamp: 1_000_000 + i,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chunks_replace_then_append() {
        let sink = InMemorySink::new();

        let (written, chunks) = write_ratings_chunked(&sink, &events(25), 10).await.unwrap();

        assert_eq!((written, chunks), (25, 3));
        assert_eq!(
            sink.rating_writes().await,
            vec![
                (WriteMode::Replace, 10),
                (WriteMode::Append, 10),
                (WriteMode::Append, 5)
            ]
        );
        assert_eq!(sink.ratings().await, events(25));
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_log() {
        let sink = InMemorySink::new();
        write_ratings_chunked(&sink, &events(7), 3).await.unwrap();
        write_ratings_chunked(&sink, &events(4), 3).await.unwrap();
        assert_eq!(sink.ratings().await.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_log_clears_sink() {
        let sink = InMemorySink::new();
        write_ratings_chunked(&sink, &events(3), 10).await.unwrap();

        let (written, chunks) = write_ratings_chunked(&sink, &[], 10).await.unwrap();

        assert_eq!((written, chunks), (0, 0));
        assert!(sink.ratings().await.is_empty());
    }
}
