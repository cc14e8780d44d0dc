//! Domain error types for driftmark.
//!
//! Projection itself never fails: a location that cannot be projected is
//! reported as absent. These errors cover the adapters around the core
//! (region decoding, baseline retrieval, log loading).

use thiserror::Error;

/// Errors decoding a recorded region into a char range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("Invalid region: line {line} is not 1-based")]
    InvalidLine { line: usize },

    #[error("Region ends before it starts: {start}..{end}")]
    Inverted { start: usize, end: usize },
}

/// Errors retrieving a baseline snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot for {document} is not valid UTF-8")]
    InvalidEncoding { document: String },

    #[error("Snapshot operation failed: {0}")]
    OperationFailed(#[from] anyhow::Error),
}

/// Errors loading an analysis log.
#[derive(Debug, Error)]
pub enum LogLoadError {
    #[error("Failed to read log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse log {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported log version: {0}")]
    UnsupportedVersion(String),
}
