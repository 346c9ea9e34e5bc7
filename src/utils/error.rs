// src/utils/error.rs
use thiserror::Error;

// Errors raised while fetching listing pages
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Access denied by the portal: {0}")]
    Forbidden(String),

    #[error("Listing not found: {0}")]
    NotFound(String),
}

/// A mandatory field could not be turned into a number.
///
/// Price fields are never coerced to an absent value, so this is fatal for
/// the row that produced it. `raw` is empty when the field was missing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Could not extract '{field}' from {raw:?}")]
pub struct ValueExtractionError {
    pub field: &'static str,
    pub raw: String,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Existing dataset has an incompatible schema: {0}")]
    SchemaConflict(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetching listing failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ValueExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid raw batch: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
