use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use crate::domain::RawRecord;

pub const IMDB_LINK_KEY: &str = "imdb_link";
pub const IMDB_ID_KEY: &str = "imdb_id";
const EPISODE_COUNT_KEY: &str = "No. of episodes";
const DIRECTOR_KEYS: [&str; 2] = ["Director", "Directed by"];

static IMDB_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d{7}").unwrap());

/// A movie entry has a director and an IMDb link; TV series carry an episode
/// count and are excluded.
pub fn is_eligible(record: &RawRecord) -> bool {
    DIRECTOR_KEYS.iter().any(|k| record.contains_key(*k))
        && record.contains_key(IMDB_LINK_KEY)
        && !record.contains_key(EPISODE_COUNT_KEY)
}

/// Extract the `tt0000000` identifier from the record's IMDb link.
pub fn extract_imdb_id(record: &RawRecord) -> Option<String> {
    let link = record.get(IMDB_LINK_KEY)?.as_str()?;
    IMDB_ID_RE.find(link).map(|m| m.as_str().to_string())
}

/// Attach `imdb_id` to each record, dropping records without one and every
/// later record that repeats an id already seen.
pub fn dedupe_by_imdb_id(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for mut record in records {
        let Some(imdb_id) = extract_imdb_id(&record) else {
            debug!("Dropping record without an IMDb id");
            continue;
        };
        if !seen.insert(imdb_id.clone()) {
            debug!(imdb_id = %imdb_id, "Dropping duplicate record");
            continue;
        }
        record.insert(IMDB_ID_KEY.to_string(), Value::String(imdb_id));
        kept.push(record);
    }

    kept
}

/// Outcome of sparse-column pruning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPruning {
    /// Surviving columns in first-seen order
    pub kept: Vec<String>,
    pub dropped: Vec<String>,
}

/// All keys across `records` in first-seen order.
pub fn column_names(records: &[RawRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Drop every column whose missing count (absent or `null`) is not below
/// `threshold` × row count. Missing rates are computed fresh over `records`.
pub fn prune_sparse_columns(records: &mut [RawRecord], threshold: f64) -> ColumnPruning {
    let row_count = records.len() as f64;
    let mut pruning = ColumnPruning::default();

    for column in column_names(records) {
        let missing = records
            .iter()
            .filter(|r| r.get(&column).map_or(true, Value::is_null))
            .count() as f64;

        if missing < row_count * threshold {
            pruning.kept.push(column);
        } else {
            pruning.dropped.push(column);
        }
    }

    for record in records.iter_mut() {
        for column in &pruning.dropped {
            record.remove(column);
        }
    }

    pruning
}
