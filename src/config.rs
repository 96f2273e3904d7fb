use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{EtlError, Result};
use crate::pipeline::processing::parse::DurationFallback;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub wiki_path: PathBuf,
    pub metadata_path: PathBuf,
    pub ratings_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_DB_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Rating events written per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Columns missing in at least this fraction of wiki rows are dropped.
    #[serde(default = "default_missing_column_threshold")]
    pub missing_column_threshold: f64,
}

fn default_chunk_size() -> usize {
    constants::DEFAULT_CHUNK_SIZE
}

fn default_missing_column_threshold() -> f64 {
    constants::DEFAULT_MISSING_COLUMN_THRESHOLD
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            missing_column_threshold: default_missing_column_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsingConfig {
    #[serde(default)]
    pub duration_fallback: DurationFallback,
}

impl Config {
    pub fn load_from<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&config_content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Environment variables (including those loaded from `.env`) win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MOVIES_ETL_WIKI_PATH") {
            self.sources.wiki_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MOVIES_ETL_METADATA_PATH") {
            self.sources.metadata_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MOVIES_ETL_RATINGS_PATH") {
            self.sources.ratings_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MOVIES_ETL_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            return Err(EtlError::Config("pipeline.chunk_size must be positive".to_string()));
        }
        let threshold = self.pipeline.missing_column_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(EtlError::Config(format!(
                "pipeline.missing_column_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [sources]
            wiki_path = "data/wikipedia-movies.json"
            metadata_path = "data/movies_metadata.csv"
            ratings_path = "data/ratings.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.chunk_size, 1_000_000);
        assert_eq!(config.pipeline.missing_column_threshold, 0.9);
        assert_eq!(config.parsing.duration_fallback, DurationFallback::Zero);
        assert_eq!(config.database.path, PathBuf::from("movie_data.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_fallback_can_be_unified() {
        let config = Config::from_toml_str(
            r#"
            [sources]
            wiki_path = "a.json"
            metadata_path = "b.csv"
            ratings_path = "c.csv"

            [parsing]
            duration_fallback = "missing"
            "#,
        )
        .unwrap();

        assert_eq!(config.parsing.duration_fallback, DurationFallback::Missing);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let config = Config::from_toml_str(
            r#"
            [sources]
            wiki_path = "a.json"
            metadata_path = "b.csv"
            ratings_path = "c.csv"

            [pipeline]
            chunk_size = 0
            "#,
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(EtlError::Config(_))));
    }
}
