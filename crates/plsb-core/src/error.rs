//! Error types for PLSB

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data unavailable from {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    #[error("Month not found: {0}")]
    MonthNotFound(String),

    #[error("Missing field '{field}' for {month}")]
    MissingField { month: String, field: String },

    #[error("Duplicate month in dataset: {0}")]
    DuplicateMonth(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
