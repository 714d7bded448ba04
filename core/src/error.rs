use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Malformed input at row {row} ({record}): {reason}")]
    MalformedInput {
        row: usize,
        record: String,
        reason: String,
    },

    #[error("Schema error: required field '{field}' is missing")]
    Schema { field: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScoreError {
    pub fn schema(field: impl Into<String>) -> Self {
        ScoreError::Schema { field: field.into() }
    }

    pub fn malformed(row: usize, record: impl Into<String>, reason: impl Into<String>) -> Self {
        ScoreError::MalformedInput {
            row,
            record: record.into(),
            reason: reason.into(),
        }
    }
}

pub type ScoreResult<T> = Result<T, ScoreError>;
