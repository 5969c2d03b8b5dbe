//! Transformation module.
//!
//! Turns decoded rows into nested JSON objects:
//! - Path: target path parsing
//! - Mapping: column name to target path lookup
//! - Row: single-row transform with scalar coercion
//! - Batch: lazy, row-indexed batch transform and policies
//! - Pipeline: reader + mappings + batch, with progress logging

pub mod batch;
pub mod mapping;
pub mod path;
pub mod pipeline;
pub mod row;

pub use batch::{run_batch, transform_batch, BatchOutcome, BatchPolicy, TransformBatch};
pub use mapping::MappingTable;
pub use path::{TargetPath, ROOT_MARKER};
pub use row::{coerce, transform_row};
