//! Error types for the sheetmap ingestion pipeline.
//!
//! One enum per layer, converted upward with `From` so `?` works across
//! boundaries:
//!
//! - [`ReaderError`] - spreadsheet / CSV decoding failures
//! - [`PathError`] - malformed target paths
//! - [`TransformError`] - row transformation errors
//! - [`RowError`] - a [`TransformError`] tagged with its row index
//! - [`StoreError`] - mapping store errors
//! - [`ConfigError`] - invalid environment configuration
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP-facing errors
//!
//! Callers that only care about the broad category use [`ErrorKind`].

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kinds
// =============================================================================

/// Broad error category surfaced to callers and API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// A target path is empty or malformed.
    InvalidMapping,
    /// The tabular input could not be decoded.
    UnreadableInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidMapping => write!(f, "InvalidMapping"),
            ErrorKind::UnreadableInput => write!(f, "UnreadableInput"),
        }
    }
}

// =============================================================================
// Reader Errors
// =============================================================================

/// Errors while decoding a spreadsheet or CSV file.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be opened or a sheet could not be read.
    #[error("Unreadable workbook: {0}")]
    Workbook(#[from] calamine::Error),

    /// The workbook contains no worksheet at all.
    #[error("Workbook has no worksheet")]
    NoWorksheet,

    /// Invalid CSV content.
    #[error("Invalid CSV content: {0}")]
    Csv(#[from] csv::Error),

    /// Bytes could not be decoded with the detected encoding.
    #[error("Failed to decode content as {0}")]
    Encoding(String),
}

impl ReaderError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::UnreadableInput
    }
}

// =============================================================================
// Path Errors
// =============================================================================

/// Why a target path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path holds only the root marker")]
    RootOnly,

    /// Zero-based index of the empty segment (e.g. `user..id`).
    #[error("segment {0} is empty")]
    EmptySegment(usize),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while transforming one row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The column is mapped to a path that cannot be used.
    #[error("Invalid mapping for column '{column}' (path '{path}'): {reason}")]
    InvalidMapping {
        column: String,
        path: String,
        #[source]
        reason: PathError,
    },
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::InvalidMapping { .. } => ErrorKind::InvalidMapping,
        }
    }
}

/// A transformation error located at a zero-based data row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row {row} rejected ({kind}): {source}", kind = .source.kind())]
pub struct RowError {
    pub row: usize,
    #[source]
    pub source: TransformError,
}

impl RowError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the mapping store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No mapping with this id.
    #[error("Column mapping not found with id: {0}")]
    NotFound(u64),

    /// The main column name is missing or blank.
    #[error("Main column name must not be blank")]
    BlankColumn,

    /// The submitted path cannot be used.
    #[error("Invalid json path '{path}': {reason}")]
    InvalidPath {
        path: String,
        #[source]
        reason: PathError,
    },

    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {message}")]
    Invalid {
        var: &'static str,
        value: String,
        message: String,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level ingestion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::ingest_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),

    /// A row failed under the fail-fast policy.
    #[error("Batch aborted: {0}")]
    Row(#[from] RowError),

    /// Mapping store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Category of the failure, if it maps onto one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineError::Reader(e) => Some(e.kind()),
            PipelineError::Row(e) => Some(e.kind()),
            PipelineError::Store(_) => None,
        }
    }

    /// Data row that caused the failure, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            PipelineError::Row(e) => Some(e.row),
            _ => None,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Store error.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid(column: &str) -> TransformError {
        TransformError::InvalidMapping {
            column: column.into(),
            path: "$.".into(),
            reason: PathError::RootOnly,
        }
    }

    #[test]
    fn test_row_error_reports_index_and_kind() {
        let err = RowError { row: 7, source: invalid("USER_ID") };
        let msg = err.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("InvalidMapping"));
        assert!(msg.contains("USER_ID"));
        assert_eq!(err.kind(), ErrorKind::InvalidMapping);
    }

    #[test]
    fn test_error_conversion_chain() {
        let row_err = RowError { row: 2, source: invalid("A") };
        let pipeline_err: PipelineError = row_err.into();
        assert_eq!(pipeline_err.row(), Some(2));
        assert_eq!(pipeline_err.kind(), Some(ErrorKind::InvalidMapping));

        let reader_err = ReaderError::NoWorksheet;
        let pipeline_err: PipelineError = reader_err.into();
        assert_eq!(pipeline_err.kind(), Some(ErrorKind::UnreadableInput));
        assert_eq!(pipeline_err.row(), None);
    }

    #[test]
    fn test_store_error_format() {
        let err = StoreError::InvalidPath {
            path: "a..b".into(),
            reason: PathError::EmptySegment(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("a..b"));
        assert!(msg.contains("segment 1"));
    }
}
