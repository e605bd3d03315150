//! Error types for loading data and validating chart configurations.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while retrieving or validating the dataset document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The resource could not be read at all.
    #[error("failed to read {location}: {source}")]
    Transport {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The resource answered with a non-success status.
    #[error("request for {location} failed with status {status}")]
    Status { location: String, status: u16 },

    /// The body is not valid JSON.
    #[error("data file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("data file has no 'metadata' object")]
    MissingMetadata,

    #[error("data file has no 'data' field")]
    MissingData,

    #[error("'data' field is not an array")]
    DataNotArray,

    /// An element of `data` is not a key-value object.
    #[error("record {index} is not an object")]
    InvalidRecord { index: usize },
}

/// Problems with a chart configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("field '{field}' not found in dataset")]
    UnknownField { field: String },

    #[error("a value metric needs a value field")]
    ValueFieldRequired,

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
