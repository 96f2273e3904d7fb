//! Cross-source reconciliation of wiki movies with typed metadata rows
//!
//! Rows are joined on IMDb id (inner, many-to-many). Columns present on both
//! sides are told apart with `_wiki` / `_kaggle` suffixes, implausible joins
//! are dropped by the release-date conflict rule, and numeric gaps in the
//! metadata are filled from the wiki side.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::{MetadataRow, WikiMovie};
use crate::pipeline::processing::filter::IMDB_ID_KEY;
use crate::pipeline::processing::metadata::METADATA_COLUMNS;

pub const WIKI_SUFFIX: &str = "_wiki";
pub const KAGGLE_SUFFIX: &str = "_kaggle";

/// Merged columns with no place in the output
pub const REDUNDANT_COLUMNS: [&str; 4] = [
    "title_wiki",
    "release_date_wiki",
    "Language",
    "Production company(s)",
];

/// `(metadata column, wiki column)`: the wiki value replaces a metadata zero
pub const FILL_GAP_PAIRS: [(&str, &str); 3] = [
    ("runtime", "running_time"),
    ("budget_kaggle", "budget_wiki"),
    ("revenue", "box_office"),
];

/// One joined pair
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub wiki: WikiMovie,
    pub metadata: MetadataRow,
}

/// Inner join on IMDb id. Output follows wiki order, then metadata order
/// within one wiki movie.
pub fn join_on_imdb_id(wiki: &[WikiMovie], metadata: &[MetadataRow]) -> Vec<MergedRow> {
    let mut index: HashMap<&str, Vec<&MetadataRow>> = HashMap::new();
    for row in metadata {
        if let Some(imdb_id) = row.imdb_id.as_deref() {
            index.entry(imdb_id).or_default().push(row);
        }
    }

    wiki.iter()
        .flat_map(|movie| {
            index
                .get(movie.imdb_id.as_str())
                .into_iter()
                .flatten()
                .map(move |row| MergedRow {
                    wiki: movie.clone(),
                    metadata: (*row).clone(),
                })
        })
        .collect()
}

/// Column names of the joined table. The join key appears once; any other
/// name present on both sides gets a source suffix.
pub fn merged_column_names(wiki_columns: &[String]) -> Vec<String> {
    let wiki_set: HashSet<&str> = wiki_columns.iter().map(String::as_str).collect();
    let metadata_set: HashSet<&str> = METADATA_COLUMNS.iter().copied().collect();

    let mut columns = Vec::with_capacity(wiki_columns.len() + METADATA_COLUMNS.len());
    for column in wiki_columns {
        if column != IMDB_ID_KEY && metadata_set.contains(column.as_str()) {
            columns.push(format!("{}{}", column, WIKI_SUFFIX));
        } else {
            columns.push(column.clone());
        }
    }
    for column in METADATA_COLUMNS {
        if column == IMDB_ID_KEY {
            continue;
        }
        if wiki_set.contains(column) {
            columns.push(format!("{}{}", column, KAGGLE_SUFFIX));
        } else {
            columns.push(column.to_string());
        }
    }
    columns
}

static WIKI_RELEASE_CUTOFF: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1996, 1, 1).unwrap());
static KAGGLE_RELEASE_CUTOFF: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1965, 1, 1).unwrap());

/// A wiki release after 1996 matched to a metadata release before 1965 is
/// two different films sharing an id. Missing dates never trigger this.
pub fn is_mismatched_join(row: &MergedRow) -> bool {
    match (row.wiki.release_date, row.metadata.release_date) {
        (Some(wiki), Some(kaggle)) => wiki > *WIKI_RELEASE_CUTOFF && kaggle < *KAGGLE_RELEASE_CUTOFF,
        _ => false,
    }
}

/// Drop mismatched joins, returning how many were removed.
pub fn drop_mismatched_joins(rows: &mut Vec<MergedRow>) -> usize {
    let before = rows.len();
    rows.retain(|row| {
        let mismatched = is_mismatched_join(row);
        if mismatched {
            debug!(
                imdb_id = %row.wiki.imdb_id,
                kaggle_id = row.metadata.id,
                "Dropping join with conflicting release dates"
            );
        }
        !mismatched
    });
    before - rows.len()
}

/// Remove redundant columns from the column list and their wiki values from
/// every row. Columns already pruned upstream are skipped.
pub fn drop_redundant_columns(columns: &mut Vec<String>, rows: &mut [MergedRow]) {
    columns.retain(|c| !REDUNDANT_COLUMNS.contains(&c.as_str()));
    for row in rows.iter_mut() {
        for column in REDUNDANT_COLUMNS {
            let field = column.strip_suffix(WIKI_SUFFIX).unwrap_or(column);
            row.wiki.fields.remove(field);
        }
    }
}

/// Keep the metadata value unless it is exactly zero, in which case the wiki
/// value is used (even when that is missing).
pub fn fill_gap(metadata: Option<f64>, wiki: Option<f64>) -> Option<f64> {
    match metadata {
        Some(v) if v == 0.0 => wiki,
        other => other,
    }
}

impl MergedRow {
    pub fn runtime(&self) -> Option<f64> {
        fill_gap(self.metadata.runtime, self.wiki.running_time.map(|m| m as f64))
    }

    pub fn budget(&self) -> Option<f64> {
        fill_gap(Some(self.metadata.budget as f64), self.wiki.budget)
    }

    pub fn revenue(&self) -> Option<f64> {
        fill_gap(self.metadata.revenue, self.wiki.box_office)
    }
}
