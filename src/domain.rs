use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One scraped wiki item as loaded: arbitrary, inconsistently labelled keys.
pub type RawRecord = serde_json::Map<String, Value>;

/// A wiki movie after unification, deduplication, column pruning and parsing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WikiMovie {
    /// Seven-digit IMDb identifier (`tt0000000`) extracted from `imdb_link`
    pub imdb_id: String,
    /// Remaining free-text columns that survived pruning, keyed by canonical name
    pub fields: BTreeMap<String, Value>,
    pub box_office: Option<f64>,
    pub budget: Option<f64>,
    pub release_date: Option<NaiveDate>,
    /// Minutes; `None` when the record had no running time at all
    pub running_time: Option<i64>,
}

impl WikiMovie {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// The field as plain text, only when it is a string.
    pub fn text_field(&self, name: &str) -> Option<String> {
        self.field(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// A metadata export row exactly as read from the CSV, every cell still text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataRecord {
    pub adult: Option<String>,
    pub belongs_to_collection: Option<String>,
    pub budget: Option<String>,
    pub genres: Option<String>,
    pub homepage: Option<String>,
    pub id: Option<String>,
    pub imdb_id: Option<String>,
    pub original_language: Option<String>,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub popularity: Option<String>,
    pub poster_path: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub release_date: Option<String>,
    pub revenue: Option<String>,
    pub runtime: Option<String>,
    pub spoken_languages: Option<String>,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub title: Option<String>,
    pub video: Option<String>,
    pub vote_average: Option<String>,
    pub vote_count: Option<String>,
}

/// A typed metadata row. Only non-adult rows are ever typed, so there is no
/// `adult` column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRow {
    pub id: i64,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub belongs_to_collection: Option<String>,
    pub homepage: Option<String>,
    pub poster_path: Option<String>,
    pub status: Option<String>,
    pub genres: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub spoken_languages: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub video: bool,
    pub budget: i64,
    pub popularity: Option<f64>,
    pub revenue: Option<f64>,
    pub runtime: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<f64>,
    pub release_date: Option<NaiveDate>,
}

/// One line of the rating log.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RatingEvent {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    /// Unix seconds
    pub timestamp: i64,
}

impl RatingEvent {
    pub fn rating_value(&self) -> RatingValue {
        RatingValue::from_f64(self.rating)
    }

    pub fn rated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// A rating value in hundredths of a star, so it can be ordered and hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RatingValue(i64);

impl RatingValue {
    pub fn from_f64(rating: f64) -> Self {
        RatingValue((rating * 100.0).round() as i64)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Pivot column name, e.g. `rating_3.5`
    pub fn column_name(self) -> String {
        format!("rating_{}", self)
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 10 == 0 {
            write!(f, "{:.1}", self.as_f64())
        } else {
            write!(f, "{:.2}", self.as_f64())
        }
    }
}

impl Serialize for RatingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One reconciled movie. Field order is the public output schema; see
/// `pipeline::processing::schema::OUTPUT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRow {
    pub imdb_id: String,
    pub kaggle_id: i64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub belongs_to_collection: Option<String>,
    pub wikipedia_url: Option<String>,
    pub imdb_link: Option<String>,
    pub runtime: Option<f64>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<f64>,
    pub genres: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub spoken_languages: Option<String>,
    pub country: Option<Value>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub distributor: Option<Value>,
    pub producers: Option<Value>,
    pub director: Option<Value>,
    pub starring: Option<Value>,
    pub cinematography: Option<Value>,
    pub editors: Option<Value>,
    pub writers: Option<Value>,
    pub composers: Option<Value>,
    pub based_on: Option<Value>,
    /// Count of rating events per rating value; zero-filled for every pivot column
    pub rating_counts: BTreeMap<RatingValue, u64>,
}

/// Per-stage row counts of one reconcile pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileStats {
    pub raw_records: usize,
    pub eligible_records: usize,
    pub deduplicated_records: usize,
    pub dropped_columns: Vec<String>,
    pub metadata_records: usize,
    pub metadata_rows: usize,
    pub joined_rows: usize,
    pub mismatched_joins_dropped: usize,
    pub rating_events: usize,
}

/// The canonical output: reconciled rows plus the rating pivot columns they carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciledTable {
    pub rating_columns: Vec<RatingValue>,
    pub rows: Vec<ReconciledRow>,
    pub stats: ReconcileStats,
}

impl ReconciledTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_value_columns() {
        assert_eq!(RatingValue::from_f64(3.5).column_name(), "rating_3.5");
        assert_eq!(RatingValue::from_f64(4.0).column_name(), "rating_4.0");
        assert!(RatingValue::from_f64(0.5) < RatingValue::from_f64(1.0));
    }

    #[test]
    fn test_rating_event_timestamp() {
        let event = RatingEvent {
            user_id: 1,
            movie_id: 110,
            rating: 1.0,
            timestamp: 1_425_941_529,
        };
        let rated_at = event.rated_at().unwrap();
        assert_eq!(rated_at.to_rfc3339(), "2015-03-09T22:52:09+00:00");
    }
}
