use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Source error: {source_name}: {message}")]
    Source { source_name: String, message: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Non-numeric value in field '{field}' at row {row}: {value:?}")]
    InvalidNumeric {
        field: String,
        row: usize,
        value: String,
    },

    #[error("Unparseable date in field '{field}' at row {row}: {value:?}")]
    InvalidDate {
        field: String,
        row: usize,
        value: String,
    },
}

impl EtlError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        EtlError::MissingColumn {
            column: column.into(),
        }
    }

    /// True for schema violations (as opposed to collaborator I/O failures).
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            EtlError::MissingColumn { .. }
                | EtlError::InvalidNumeric { .. }
                | EtlError::InvalidDate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
