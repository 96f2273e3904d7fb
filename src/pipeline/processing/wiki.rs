use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::constants;
use crate::domain::{RawRecord, WikiMovie};
use crate::error::{EtlError, Result};
use crate::pipeline::processing::filter::{self, ColumnPruning, IMDB_ID_KEY};
use crate::pipeline::processing::parse::{
    clean_budget_text, parse_date_value, parse_duration_value, parse_money, parse_money_value,
    text_of, DurationFallback,
};
use crate::pipeline::processing::unify::unify_record;

pub const BOX_OFFICE_KEY: &str = "Box office";
pub const BUDGET_KEY: &str = "Budget";
pub const RELEASE_DATE_KEY: &str = "Release date";
pub const RUNNING_TIME_KEY: &str = "Running time";

/// Free-text columns replaced by a parsed, typed column
pub const PARSED_SOURCE_COLUMNS: [(&str, &str); 4] = [
    (BOX_OFFICE_KEY, "box_office"),
    (BUDGET_KEY, "budget"),
    (RELEASE_DATE_KEY, "release_date"),
    (RUNNING_TIME_KEY, "running_time"),
];

/// Wiki movies plus the column set that survived pruning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WikiTable {
    /// Column names after parsing (typed columns replace their free-text source)
    pub columns: Vec<String>,
    pub movies: Vec<WikiMovie>,
    pub eligible_records: usize,
    pub pruning: ColumnPruning,
}

#[derive(Debug, Clone, Copy)]
pub struct WikiOptions {
    pub missing_column_threshold: f64,
    pub duration_fallback: DurationFallback,
}

/// Filter, unify, deduplicate, prune and parse the scraped wiki records.
pub fn build_wiki_table(raw_records: Vec<RawRecord>, options: WikiOptions) -> Result<WikiTable> {
    let raw_count = raw_records.len();

    let unified: Vec<RawRecord> = raw_records
        .iter()
        .filter(|r| filter::is_eligible(r))
        .map(unify_record)
        .collect();
    let eligible_records = unified.len();
    info!("{} of {} wiki records are movies", eligible_records, raw_count);

    let mut records = filter::dedupe_by_imdb_id(unified);
    if records.is_empty() {
        return Err(EtlError::Source {
            source_name: constants::WIKI_SOURCE.to_string(),
            message: "no eligible records with an IMDb id".to_string(),
        });
    }
    info!("{} wiki movies after deduplication", records.len());

    let pruning = filter::prune_sparse_columns(&mut records, options.missing_column_threshold);
    if !pruning.dropped.is_empty() {
        debug!("Dropped sparse wiki columns: {:?}", pruning.dropped);
    }

    for (source, _) in PARSED_SOURCE_COLUMNS {
        if !pruning.kept.iter().any(|c| c == source) {
            return Err(EtlError::missing_column(source));
        }
    }

    let movies = records
        .into_iter()
        .map(|record| parse_movie(record, options.duration_fallback))
        .collect::<Result<Vec<_>>>()?;

    let mut columns: Vec<String> = pruning
        .kept
        .iter()
        .filter(|c| !PARSED_SOURCE_COLUMNS.iter().any(|(source, _)| *source == c.as_str()))
        .cloned()
        .collect();
    columns.extend(PARSED_SOURCE_COLUMNS.iter().map(|(_, parsed)| parsed.to_string()));

    Ok(WikiTable {
        columns,
        movies,
        eligible_records,
        pruning,
    })
}

/// Take a free-text column out of the record, treating `null` as absent.
fn take(record: &mut RawRecord, key: &str) -> Option<Value> {
    record.remove(key).filter(|v| !v.is_null())
}

fn parse_movie(mut record: RawRecord, duration_fallback: DurationFallback) -> Result<WikiMovie> {
    let imdb_id = match record.remove(IMDB_ID_KEY) {
        Some(Value::String(id)) => id,
        _ => return Err(EtlError::missing_column(IMDB_ID_KEY)),
    };

    let box_office = take(&mut record, BOX_OFFICE_KEY)
        .and_then(|v| parse_money_value(&v).into_option());

    let budget = take(&mut record, BUDGET_KEY)
        .and_then(|v| text_of(&v))
        .and_then(|text| parse_money(&clean_budget_text(&text)).into_option());

    let release_date = take(&mut record, RELEASE_DATE_KEY)
        .and_then(|v| parse_date_value(&v).into_option());

    let running_time = take(&mut record, RUNNING_TIME_KEY)
        .and_then(|v| parse_duration_value(&v, duration_fallback));

    Ok(WikiMovie {
        imdb_id,
        fields: record.into_iter().collect::<BTreeMap<_, _>>(),
        box_office,
        budget,
        release_date,
        running_time,
    })
}
