use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementAnalysisError {
    #[error("Standard sheets not found: expected at least one of {}", expected.join(", "))]
    StandardSheetsNotFound { expected: Vec<String> },

    #[error("Invalid base valuation {0}: must be a finite, non-negative number")]
    InvalidBaseValuation(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed sheet '{sheet}': {details}")]
    MalformedSheet { sheet: String, details: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),
}

pub type Result<T> = std::result::Result<T, StatementAnalysisError>;
