//! Error types for the geolocation benchmark.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, GeoBenchError>;

/// Errors that can occur while loading data, talking to remote APIs or
/// persisting results.
///
/// Scoring a single sample never produces one of these; see
/// [`crate::scorer::ScoreError`] for the per-sample taxonomy.
#[derive(Error, Debug)]
pub enum GeoBenchError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The dataset CSV does not exist.
    #[error("Dataset not found at '{0}'")]
    DatasetNotFound(PathBuf),

    /// The image directory does not exist or is not a directory.
    #[error("Image directory '{0}' does not exist or is not a directory")]
    InvalidImageDir(PathBuf),

    /// A dataset row could not be decoded.
    #[error("Malformed dataset row {row}: {message}")]
    DatasetRow { row: usize, message: String },

    /// The saved report does not exist.
    #[error("Report not found at '{0}'")]
    ReportNotFound(PathBuf),

    /// A literal value could not be parsed.
    #[error("Invalid literal at byte {offset}: {message}")]
    Literal { offset: usize, message: String },

    /// A coordinate outside the valid latitude/longitude range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// LLM API error.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// LLM response parsing error.
    #[error("Failed to parse LLM response: {0}")]
    LlmParse(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Street View tool failure.
    #[error("Street View error: {0}")]
    StreetView(String),
}

impl GeoBenchError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for GeoBenchError {
    fn from(err: reqwest::Error) -> Self {
        GeoBenchError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for GeoBenchError {
    fn from(err: serde_json::Error) -> Self {
        GeoBenchError::LlmParse(err.to_string())
    }
}

impl From<csv::Error> for GeoBenchError {
    fn from(err: csv::Error) -> Self {
        let row = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        GeoBenchError::DatasetRow {
            row,
            message: err.to_string(),
        }
    }
}
