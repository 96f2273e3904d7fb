use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants;
use crate::domain::{MetadataRecord, RatingEvent, RawRecord, ReconcileStats, ReconciledTable};
use crate::error::Result;
use crate::metrics::ReconcileMetrics;
use crate::pipeline::processing::conflation::{self, join_on_imdb_id, merged_column_names};
use crate::pipeline::processing::metadata::clean_metadata;
use crate::pipeline::processing::parse::DurationFallback;
use crate::pipeline::processing::ratings::RatingCounts;
use crate::pipeline::processing::schema;
use crate::pipeline::processing::wiki::{build_wiki_table, WikiOptions};

/// Knobs of a reconcile pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOptions {
    pub missing_column_threshold: f64,
    pub duration_fallback: DurationFallback,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            missing_column_threshold: constants::DEFAULT_MISSING_COLUMN_THRESHOLD,
            duration_fallback: DurationFallback::default(),
        }
    }
}

impl From<&Config> for ReconcileOptions {
    fn from(config: &Config) -> Self {
        Self {
            missing_column_threshold: config.pipeline.missing_column_threshold,
            duration_fallback: config.parsing.duration_fallback,
        }
    }
}

/// Turn the three raw sources into the canonical output table.
///
/// Pure apart from logging and metrics: the same inputs always give the same
/// table. Any schema violation aborts the whole pass.
pub fn reconcile(
    raw_records: Vec<RawRecord>,
    metadata_rows: Vec<MetadataRecord>,
    rating_events: &[RatingEvent],
    options: &ReconcileOptions,
) -> Result<ReconciledTable> {
    let started = Instant::now();
    let result = reconcile_inner(raw_records, metadata_rows, rating_events, options);

    match &result {
        Ok(table) => {
            ReconcileMetrics::record_stats(&table.stats, table.len(), started.elapsed().as_secs_f64())
        }
        Err(e) => {
            warn!("Reconcile failed: {}", e);
            ReconcileMetrics::record_failure(e.is_schema_violation());
        }
    }
    result
}

fn reconcile_inner(
    raw_records: Vec<RawRecord>,
    metadata_rows: Vec<MetadataRecord>,
    rating_events: &[RatingEvent],
    options: &ReconcileOptions,
) -> Result<ReconciledTable> {
    let mut stats = ReconcileStats {
        raw_records: raw_records.len(),
        metadata_records: metadata_rows.len(),
        rating_events: rating_events.len(),
        ..Default::default()
    };

    let wiki = build_wiki_table(
        raw_records,
        WikiOptions {
            missing_column_threshold: options.missing_column_threshold,
            duration_fallback: options.duration_fallback,
        },
    )?;
    stats.eligible_records = wiki.eligible_records;
    stats.deduplicated_records = wiki.movies.len();
    stats.dropped_columns = wiki.pruning.dropped.clone();

    let metadata = clean_metadata(&metadata_rows)?;
    stats.metadata_rows = metadata.len();

    let mut columns = merged_column_names(&wiki.columns);
    let mut merged = join_on_imdb_id(&wiki.movies, &metadata);
    stats.joined_rows = merged.len();
    info!(
        "Joined {} wiki movies with {} metadata rows into {} rows",
        wiki.movies.len(),
        metadata.len(),
        merged.len()
    );

    stats.mismatched_joins_dropped = conflation::drop_mismatched_joins(&mut merged);
    if stats.mismatched_joins_dropped > 0 {
        info!(
            "Dropped {} joins with conflicting release dates",
            stats.mismatched_joins_dropped
        );
    }

    conflation::drop_redundant_columns(&mut columns, &mut merged);
    schema::validate_columns(&columns)?;

    let mut rows = schema::project(merged);

    let counts = RatingCounts::aggregate(rating_events);
    counts.attach(&mut rows);
    info!(
        "Aggregated {} rating events for {} movies into {} rating columns",
        rating_events.len(),
        counts.movie_count(),
        counts.columns().len()
    );

    Ok(ReconciledTable {
        rating_columns: counts.columns().to_vec(),
        rows,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RatingValue;
    use crate::error::EtlError;
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn wiki_movie(imdb_id: &str, title: &str, released: &str) -> RawRecord {
        record(json!({
            "url": format!("https://en.wikipedia.org/wiki/{}", title),
            "title": title,
            "Directed by": "Director",
            "Produced by": "Producer",
            "Written by": "Writer",
            "Starring": ["Lead", "Support"],
            "Music by": "Composer",
            "Cinematography": "DP",
            "Edited by": "Editor",
            "Distributed by": "Distributor",
            "Country": "United States",
            "Based on": "A novel",
            "Language": "English",
            "imdb_link": format!("https://www.imdb.com/title/{}/", imdb_id),
            "Box office": "$12 million",
            "Budget": "$3 million",
            "Release date": released,
            "Running time": "101 minutes"
        }))
    }

    fn metadata(id: &str, imdb_id: &str, budget: &str, release_date: &str) -> MetadataRecord {
        MetadataRecord {
            adult: Some("False".to_string()),
            id: Some(id.to_string()),
            imdb_id: Some(imdb_id.to_string()),
            budget: Some(budget.to_string()),
            popularity: Some("1.5".to_string()),
            title: Some(format!("Kaggle {}", id)),
            revenue: Some("0".to_string()),
            runtime: Some("0".to_string()),
            release_date: Some(release_date.to_string()),
            ..Default::default()
        }
    }

    fn rating(movie_id: i64, rating: f64) -> RatingEvent {
        RatingEvent {
            user_id: 7,
            movie_id,
            rating,
            timestamp: 964_982_703,
        }
    }

    #[test]
    fn test_reconcile_end_to_end() {
        let raw = vec![
            wiki_movie("tt0000001", "First", "March 3, 1990"),
            wiki_movie("tt0000002", "Second", "2004"),
            wiki_movie("tt0000001", "First again", "1990"),
        ];
        let meta = vec![
            metadata("1", "tt0000001", "5000000", "1990-03-03"),
            metadata("2", "tt0000002", "0", "1950-01-01"),
            metadata("3", "tt0000009", "0", "2000-01-01"),
        ];
        let events = vec![rating(1, 4.0), rating(1, 4.0), rating(1, 2.5), rating(3, 5.0)];

        let table = reconcile(raw, meta, &events, &ReconcileOptions::default()).unwrap();

        // tt0000002 joins a pre-1965 metadata row with a post-1996 wiki date
        assert_eq!(table.len(), 1);
        assert_eq!(table.stats.deduplicated_records, 2);
        assert_eq!(table.stats.joined_rows, 2);
        assert_eq!(table.stats.mismatched_joins_dropped, 1);

        let row = &table.rows[0];
        assert_eq!(row.imdb_id, "tt0000001");
        assert_eq!(row.kaggle_id, 1);
        assert_eq!(row.title.as_deref(), Some("Kaggle 1"));
        assert_eq!(row.budget, Some(5_000_000.0));
        assert_eq!(row.revenue, Some(12_000_000.0));
        assert_eq!(row.runtime, Some(101.0));
        assert_eq!(row.director, Some(json!("Director")));
        assert_eq!(row.writers, Some(json!("Writer")));

        assert_eq!(
            table.rating_columns,
            vec![
                RatingValue::from_f64(2.5),
                RatingValue::from_f64(4.0),
                RatingValue::from_f64(5.0)
            ]
        );
        assert_eq!(row.rating_counts[&RatingValue::from_f64(4.0)], 2);
        assert_eq!(row.rating_counts[&RatingValue::from_f64(5.0)], 0);
    }

    #[test]
    fn test_is_deterministic() {
        let build = || {
            reconcile(
                vec![
                    wiki_movie("tt0000001", "A", "1999"),
                    wiki_movie("tt0000002", "B", "1998"),
                ],
                vec![
                    metadata("1", "tt0000001", "10", "1999-01-01"),
                    metadata("2", "tt0000002", "20", "1998-01-01"),
                ],
                &[rating(2, 3.0)],
                &ReconcileOptions::default(),
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_pruned_output_column_is_fatal() {
        let raw: Vec<RawRecord> = (1..=10)
            .map(|i| {
                let mut r = wiki_movie(&format!("tt{:07}", i), "M", "1999");
                r.remove("Cinematography");
                r
            })
            .collect();
        let meta = vec![metadata("1", "tt0000001", "10", "1999-01-01")];

        let err = reconcile(raw, meta, &[], &ReconcileOptions::default()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { ref column } if column == "Cinematography"));
    }

    #[test]
    fn test_bad_metadata_id_is_fatal() {
        let err = reconcile(
            vec![wiki_movie("tt0000001", "A", "1999")],
            vec![metadata("1997-08-20", "tt0000001", "0", "1999-01-01")],
            &[],
            &ReconcileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::InvalidNumeric { ref field, .. } if field == "id"));
    }
}
