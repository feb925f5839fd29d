//! Error types for dataset splitting, configuration and classification.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for split operations.
pub type SplitResult<T> = Result<T, SplitError>;

/// Fatal errors for a split run. All of these are raised before anything is
/// written to the destination, except `Io` which covers creating the
/// top-level split directories.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Source directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Result type for classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors raised by the classification service and its collaborators.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Classifier returned no scores")]
    EmptyScores,

    #[error("Classifier failed: {0}")]
    Model(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Label table is empty")]
    EmptyLabelTable,

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}
