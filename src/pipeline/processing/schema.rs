use serde_json::Value;

use crate::domain::ReconciledRow;
use crate::error::{EtlError, Result};
use crate::pipeline::processing::conflation::MergedRow;

/// Storage type of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        }
    }
}

/// Where an output column's value comes from, by merged-table column name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    JoinKey,
    Metadata(&'static str),
    Wiki(&'static str),
    FillGap {
        metadata: &'static str,
        wiki: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputColumn {
    pub name: &'static str,
    pub source: ColumnSource,
    pub sql_type: SqlType,
}

const fn column(name: &'static str, source: ColumnSource, sql_type: SqlType) -> OutputColumn {
    OutputColumn {
        name,
        source,
        sql_type,
    }
}

use ColumnSource::{FillGap, JoinKey, Metadata, Wiki};
use SqlType::{Integer, Real, Text};

/// The public output schema, in order. `ReconciledRow` mirrors it field by field.
pub const OUTPUT_COLUMNS: [OutputColumn; 31] = [
    column("imdb_id", JoinKey, Text),
    column("kaggle_id", Metadata("id"), Integer),
    column("title", Metadata("title_kaggle"), Text),
    column("original_title", Metadata("original_title"), Text),
    column("tagline", Metadata("tagline"), Text),
    column("belongs_to_collection", Metadata("belongs_to_collection"), Text),
    column("wikipedia_url", Wiki("url"), Text),
    column("imdb_link", Wiki("imdb_link"), Text),
    column("runtime", FillGap { metadata: "runtime", wiki: "running_time" }, Real),
    column("budget", FillGap { metadata: "budget_kaggle", wiki: "budget_wiki" }, Real),
    column("revenue", FillGap { metadata: "revenue", wiki: "box_office" }, Real),
    column("release_date", Metadata("release_date_kaggle"), Text),
    column("popularity", Metadata("popularity"), Real),
    column("vote_average", Metadata("vote_average"), Real),
    column("vote_count", Metadata("vote_count"), Real),
    column("genres", Metadata("genres"), Text),
    column("original_language", Metadata("original_language"), Text),
    column("overview", Metadata("overview"), Text),
    column("spoken_languages", Metadata("spoken_languages"), Text),
    column("country", Wiki("Country"), Text),
    column("production_companies", Metadata("production_companies"), Text),
    column("production_countries", Metadata("production_countries"), Text),
    column("distributor", Wiki("Distributor"), Text),
    column("producers", Wiki("Producer(s)"), Text),
    column("director", Wiki("Director"), Text),
    column("starring", Wiki("Starring"), Text),
    column("cinematography", Wiki("Cinematography"), Text),
    column("editors", Wiki("Editor(s)"), Text),
    column("writers", Wiki("Writer(s)"), Text),
    column("composers", Wiki("Composer(s)"), Text),
    column("based_on", Wiki("Based on"), Text),
];

pub fn output_column_names() -> impl Iterator<Item = &'static str> {
    OUTPUT_COLUMNS.iter().map(|c| c.name)
}

/// Every merged column the projection reads must exist.
pub fn validate_columns(merged_columns: &[String]) -> Result<()> {
    let has = |name: &str| merged_columns.iter().any(|c| c == name);

    for output in &OUTPUT_COLUMNS {
        let required: Vec<&str> = match output.source {
            JoinKey => vec![],
            Metadata(name) | Wiki(name) => vec![name],
            FillGap { metadata, wiki } => vec![metadata, wiki],
        };
        if let Some(missing) = required.iter().find(|name| !has(name)) {
            return Err(EtlError::missing_column(*missing));
        }
    }
    Ok(())
}

/// Project merged rows onto the output schema. Rating counts are attached later.
pub fn project(rows: Vec<MergedRow>) -> Vec<ReconciledRow> {
    rows.into_iter().map(project_row).collect()
}

fn project_row(row: MergedRow) -> ReconciledRow {
    let runtime = row.runtime();
    let budget = row.budget();
    let revenue = row.revenue();
    let MergedRow { wiki, metadata } = row;
    let field = |name: &str| wiki.field(name).cloned();

    ReconciledRow {
        imdb_id: wiki.imdb_id.clone(),
        kaggle_id: metadata.id,
        title: metadata.title,
        original_title: metadata.original_title,
        tagline: metadata.tagline,
        belongs_to_collection: metadata.belongs_to_collection,
        wikipedia_url: wiki.text_field("url"),
        imdb_link: wiki.text_field("imdb_link"),
        runtime,
        budget,
        revenue,
        release_date: metadata.release_date,
        popularity: metadata.popularity,
        vote_average: metadata.vote_average,
        vote_count: metadata.vote_count,
        genres: metadata.genres,
        original_language: metadata.original_language,
        overview: metadata.overview,
        spoken_languages: metadata.spoken_languages,
        country: field("Country"),
        production_companies: metadata.production_companies,
        production_countries: metadata.production_countries,
        distributor: field("Distributor"),
        producers: field("Producer(s)"),
        director: field("Director"),
        starring: field("Starring"),
        cinematography: field("Cinematography"),
        editors: field("Editor(s)"),
        writers: field("Writer(s)"),
        composers: field("Composer(s)"),
        based_on: field("Based on"),
        rating_counts: Default::default(),
    }
}

/// A storable cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Null, Cell::Text)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Real)
    }
}

/// Wiki people columns hold a string or a list; lists are stored as JSON text.
impl From<Option<Value>> for Cell {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Null,
            Some(Value::String(s)) => Cell::Text(s),
            Some(other) => Cell::Text(other.to_string()),
        }
    }
}

impl ReconciledRow {
    /// Cells in `OUTPUT_COLUMNS` order, excluding rating columns.
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.imdb_id.clone()),
            Cell::Integer(self.kaggle_id),
            self.title.clone().into(),
            self.original_title.clone().into(),
            self.tagline.clone().into(),
            self.belongs_to_collection.clone().into(),
            self.wikipedia_url.clone().into(),
            self.imdb_link.clone().into(),
            self.runtime.into(),
            self.budget.into(),
            self.revenue.into(),
            self.release_date.map(|d| d.format("%Y-%m-%d").to_string()).into(),
            self.popularity.into(),
            self.vote_average.into(),
            self.vote_count.into(),
            self.genres.clone().into(),
            self.original_language.clone().into(),
            self.overview.clone().into(),
            self.spoken_languages.clone().into(),
            self.country.clone().into(),
            self.production_companies.clone().into(),
            self.production_countries.clone().into(),
            self.distributor.clone().into(),
            self.producers.clone().into(),
            self.director.clone().into(),
            self.starring.clone().into(),
            self.cinematography.clone().into(),
            self.editors.clone().into(),
            self.writers.clone().into(),
            self.composers.clone().into(),
            self.based_on.clone().into(),
        ]
    }
}
