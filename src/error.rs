//! Error types for sheet storage operations

use thiserror::Error;

/// Errors raised while resolving, creating, or appending to a sheet.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Existence check against the backing store failed
    #[error("failed to stat sheet '{sheet}': {source}")]
    Stat {
        sheet: String,
        source: opendal::Error,
    },

    /// Reading sheet contents failed
    #[error("failed to read sheet '{sheet}': {source}")]
    Read {
        sheet: String,
        source: opendal::Error,
    },

    /// Writing sheet contents failed
    #[error("failed to write sheet '{sheet}': {source}")]
    Write {
        sheet: String,
        source: opendal::Error,
    },

    /// Encoding a row to CSV failed
    #[error("failed to encode row for sheet '{sheet}': {source}")]
    Encode { sheet: String, source: csv::Error },

    /// Sheet contents could not be decoded as CSV rows
    #[error("sheet '{sheet}' contains malformed rows: {source}")]
    Decode { sheet: String, source: csv::Error },

    /// Readiness probe against the backing store failed
    #[error("store is unreachable: {source}")]
    Unreachable { source: opendal::Error },
}

/// Result type alias for StoreError
pub type Result<T> = std::result::Result<T, StoreError>;
