//! Errors raised by the host configuration model

use std::path::PathBuf;

use thiserror::Error;

/// Errors from property source loading and source list manipulation
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Property source not found: {0}")]
    NotFound(String),

    #[error("Property source cannot be positioned relative to itself: {0}")]
    SelfRelative(String),

    #[error("Invalid command line argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from placeholder resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("Circular placeholder reference '{0}'")]
    Circular(String),
}
