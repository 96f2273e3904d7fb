//! Readers for the three source files

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::constants::{METADATA_SOURCE, RATINGS_SOURCE, WIKI_SOURCE};
use crate::domain::{MetadataRecord, RatingEvent, RawRecord};
use crate::error::{EtlError, Result};
use crate::metrics::SourcesMetrics;

fn source_error(source_name: &str, path: &Path, err: impl std::fmt::Display) -> EtlError {
    EtlError::Source {
        source_name: source_name.to_string(),
        message: format!("{}: {}", path.display(), err),
    }
}

fn open(source_name: &str, path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        SourcesMetrics::record_load_error(source_name);
        source_error(source_name, path, e)
    })
}

fn record_loaded(source_name: &str, path: &Path, count: usize, started: Instant) {
    let elapsed = started.elapsed().as_secs_f64();
    SourcesMetrics::record_load_success(source_name, count, elapsed);
    info!(
        "Loaded {} {} records from {} in {:.2}s",
        count,
        source_name,
        path.display(),
        elapsed
    );
}

/// Read the scraped wiki dump: a JSON array of objects.
pub fn load_wiki_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let started = Instant::now();
    let reader = BufReader::new(open(WIKI_SOURCE, path)?);

    let items: Vec<Value> = serde_json::from_reader(reader).map_err(|e| {
        SourcesMetrics::record_load_error(WIKI_SOURCE);
        EtlError::Json(e)
    })?;

    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(source_error(
                WIKI_SOURCE,
                path,
                format!("item {} is not an object: {}", i, other),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    record_loaded(WIKI_SOURCE, path, records.len(), started);
    Ok(records)
}

/// Read the metadata export. Every cell stays text; short rows are padded
/// with empty cells.
pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<MetadataRecord>> {
    let path = path.as_ref();
    let started = Instant::now();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(open(METADATA_SOURCE, path)?);

    let records = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<MetadataRecord>, _>>()
        .map_err(|e| {
            SourcesMetrics::record_load_error(METADATA_SOURCE);
            EtlError::Csv(e)
        })?;

    record_loaded(METADATA_SOURCE, path, records.len(), started);
    Ok(records)
}

/// Read the rating log (`userId,movieId,rating,timestamp`).
pub fn load_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<RatingEvent>> {
    let path = path.as_ref();
    let started = Instant::now();
    let mut rdr = csv::Reader::from_reader(open(RATINGS_SOURCE, path)?);

    let events = rdr
        .deserialize()
        .collect::<std::result::Result<Vec<RatingEvent>, _>>()
        .map_err(|e| {
            SourcesMetrics::record_load_error(RATINGS_SOURCE);
            EtlError::Csv(e)
        })?;

    record_loaded(RATINGS_SOURCE, path, events.len(), started);
    if let Some((earliest, latest)) = rating_time_span(&events) {
        info!(
            "Ratings span {} to {}",
            earliest.to_rfc3339(),
            latest.to_rfc3339()
        );
    }
    Ok(events)
}

/// Earliest and latest rating time; timestamps out of range are skipped.
pub fn rating_time_span(events: &[RatingEvent]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    events
        .iter()
        .filter_map(RatingEvent::rated_at)
        .fold(None, |span, at| match span {
            None => Some((at, at)),
            Some((earliest, latest)) => Some((earliest.min(at), latest.max(at))),
        })
}
