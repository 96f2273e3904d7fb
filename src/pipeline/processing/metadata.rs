use chrono::NaiveDate;
use tracing::info;

use crate::domain::{MetadataRecord, MetadataRow};
use crate::error::{EtlError, Result};

/// Column names of a typed metadata row (the `adult` flag is gone by then)
pub const METADATA_COLUMNS: [&str; 23] = [
    "belongs_to_collection",
    "budget",
    "genres",
    "homepage",
    "id",
    "imdb_id",
    "original_language",
    "original_title",
    "overview",
    "popularity",
    "poster_path",
    "production_companies",
    "production_countries",
    "release_date",
    "revenue",
    "runtime",
    "spoken_languages",
    "status",
    "tagline",
    "title",
    "video",
    "vote_average",
    "vote_count",
];

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn invalid_numeric(field: &str, row: usize, value: Option<&str>) -> EtlError {
    EtlError::InvalidNumeric {
        field: field.to_string(),
        row,
        value: value.unwrap_or_default().to_string(),
    }
}

/// A whole number; integral floats such as `862.0` are accepted.
fn parse_integer(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn required_integer(field: &str, row: usize, value: &Option<String>) -> Result<i64> {
    let text = non_empty(value);
    text.and_then(parse_integer)
        .ok_or_else(|| invalid_numeric(field, row, text))
}

/// Empty is fine; present but non-numeric is not.
fn strict_float(field: &str, row: usize, value: &Option<String>) -> Result<Option<f64>> {
    match non_empty(value) {
        None => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid_numeric(field, row, Some(text))),
    }
}

fn lenient_float(value: &Option<String>) -> Option<f64> {
    non_empty(value).and_then(|s| s.parse::<f64>().ok())
}

fn release_date(row: usize, value: &Option<String>) -> Result<Option<NaiveDate>> {
    let Some(text) = non_empty(value) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .map(Some)
        .map_err(|_| EtlError::InvalidDate {
            field: "release_date".to_string(),
            row,
            value: text.to_string(),
        })
}

fn text(value: &Option<String>) -> Option<String> {
    non_empty(value).map(|s| s.to_string())
}

/// Type one non-adult metadata record. `row` is its position in the export.
pub fn type_metadata_record(row: usize, record: &MetadataRecord) -> Result<MetadataRow> {
    Ok(MetadataRow {
        id: required_integer("id", row, &record.id)?,
        imdb_id: text(&record.imdb_id),
        title: text(&record.title),
        original_title: text(&record.original_title),
        tagline: text(&record.tagline),
        belongs_to_collection: text(&record.belongs_to_collection),
        homepage: text(&record.homepage),
        poster_path: text(&record.poster_path),
        status: text(&record.status),
        genres: text(&record.genres),
        original_language: text(&record.original_language),
        overview: text(&record.overview),
        spoken_languages: text(&record.spoken_languages),
        production_companies: text(&record.production_companies),
        production_countries: text(&record.production_countries),
        video: non_empty(&record.video) == Some("True"),
        budget: required_integer("budget", row, &record.budget)?,
        popularity: strict_float("popularity", row, &record.popularity)?,
        revenue: lenient_float(&record.revenue),
        runtime: lenient_float(&record.runtime),
        vote_average: lenient_float(&record.vote_average),
        vote_count: lenient_float(&record.vote_count),
        release_date: release_date(row, &record.release_date)?,
    })
}

/// Keep rows flagged `adult == False`, then type them. Any non-coercible
/// numeric or date cell in a kept row aborts the whole batch.
pub fn clean_metadata(records: &[MetadataRecord]) -> Result<Vec<MetadataRow>> {
    let rows = records
        .iter()
        .enumerate()
        .filter(|(_, r)| non_empty(&r.adult) == Some("False"))
        .map(|(row, r)| type_metadata_record(row, r))
        .collect::<Result<Vec<_>>>()?;

    info!(
        "{} of {} metadata rows kept after adult filter",
        rows.len(),
        records.len()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(adult: &str, id: &str, budget: &str, popularity: &str) -> MetadataRecord {
        MetadataRecord {
            adult: Some(adult.to_string()),
            id: Some(id.to_string()),
            budget: Some(budget.to_string()),
            popularity: Some(popularity.to_string()),
            imdb_id: Some("tt0114709".to_string()),
            title: Some("Toy Story".to_string()),
            video: Some("False".to_string()),
            release_date: Some("1995-10-30".to_string()),
            runtime: Some("81.0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_types_a_row() {
        let rows = clean_metadata(&[record("False", "862", "30000000", "21.946943")]).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, 862);
        assert_eq!(row.budget, 30_000_000);
        assert_eq!(row.popularity, Some(21.946943));
        assert_eq!(row.runtime, Some(81.0));
        assert!(!row.video);
        assert_eq!(row.release_date, NaiveDate::from_ymd_opt(1995, 10, 30));
        assert_eq!(row.revenue, None);
    }

    #[test]
    fn test_adult_and_malformed_adult_rows_are_dropped_before_typing() {
        let rows = clean_metadata(&[
            record("True", "1", "0", "1.0"),
            record(" - Written by Ørnås", "1997-08-20", "/ff9qCepilowshEtG2GYWwzt2bs4.jpg", "x"),
            record("False", "2", "0", "1.0"),
        ])
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }

    #[test]
    fn test_non_numeric_id_is_fatal() {
        let err = clean_metadata(&[record("False", "1997-08-20", "0", "1.0")]).unwrap_err();
        match err {
            EtlError::InvalidNumeric { field, row, value } => {
                assert_eq!(field, "id");
                assert_eq!(row, 0);
                assert_eq!(value, "1997-08-20");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_popularity_is_fatal() {
        let err = clean_metadata(&[record("False", "5", "0", "Beware Of Frost Bites")]).unwrap_err();
        assert!(err.is_schema_violation());
    }

    #[test]
    fn test_bad_release_date_is_fatal() {
        let mut r = record("False", "5", "0", "1.0");
        r.release_date = Some("someday".to_string());
        let err = clean_metadata(&[r]).unwrap_err();
        assert!(matches!(err, EtlError::InvalidDate { .. }));
    }
}
