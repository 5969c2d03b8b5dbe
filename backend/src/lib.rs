//! # Sheetmap - spreadsheet rows to nested JSON objects
//!
//! Sheetmap reads Excel workbooks (and CSV files), looks up a target path
//! for every column in a mapping store and builds one nested JSON object
//! per row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ XLSX / CSV  │────▶│   Reader    │────▶│  Transform  │────▶│ Nested JSON │
//! │   upload    │     │ header+rows │     │ path+coerce │     │  records    │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │ Mapping     │
//!                                         │ store       │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetmap::{ingest_file, IngestOptions, MappingRequest, MappingStore};
//!
//! let mut store = MappingStore::open_default()?;
//! store.create(MappingRequest::new("USER_ID", "$.user.id"))?;
//!
//! let result = ingest_file("clients.xlsx", &store.mapping_table(), IngestOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&result.records)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment configuration
//! - [`models`] - Cells, rows, output nodes and column mappings
//! - [`parser`] - Workbook and CSV reading
//! - [`transform`] - Path parsing, row/batch transformation and pipeline
//! - [`store`] - File-backed mapping store
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Reading
pub mod parser;

// Transformation
pub mod transform;

// Mapping persistence
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ErrorKind, PathError, PipelineError, ReaderError, RowError, ServerError,
    StoreError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, ColumnMapping, MappingRequest, Node, RawRow, Scalar};

// =============================================================================
// Re-exports - Reader
// =============================================================================

pub use parser::{read_bytes, read_file, SourceFormat, Table};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    coerce, run_batch, transform_batch, transform_row, BatchOutcome, BatchPolicy, MappingTable,
    TargetPath,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    ingest_bytes, ingest_file, ingest_table, IngestOptions, IngestResult, SkippedRow, TableInfo,
};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{MappingStore, Page, PageRequest, SearchField};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, UploadMetadata, UploadResponse};
pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
