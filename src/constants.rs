//! Shared names and defaults used across loaders, sinks and the CLI

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_DB_PATH: &str = "movie_data.db";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Rating events per chunk when bulk-loading the rating log
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

/// Wiki columns missing in at least this share of rows are pruned
pub const DEFAULT_MISSING_COLUMN_THRESHOLD: f64 = 0.9;

// Source names used in logs and error messages
pub const WIKI_SOURCE: &str = "wiki";
pub const METADATA_SOURCE: &str = "kaggle_metadata";
pub const RATINGS_SOURCE: &str = "kaggle_ratings";

// Store table names
pub const MOVIES_TABLE: &str = "movies";
pub const RATINGS_TABLE: &str = "ratings";
pub const RUNS_TABLE: &str = "etl_runs";
