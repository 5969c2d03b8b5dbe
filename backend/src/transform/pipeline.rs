//! High-level ingestion API: spreadsheet in, nested JSON records out.
//!
//! Combines the reader, a mapping snapshot and the batch transformer, and
//! reports progress through the log broadcaster.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetmap::{ingest_file, IngestOptions, MappingStore};
//!
//! let store = MappingStore::open_default()?;
//! let result = ingest_file("clients.xlsx", &store.mapping_table(), IngestOptions::default())?;
//! println!("{} records", result.records.len());
//! ```

use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

use super::batch::{run_batch, BatchPolicy};
use super::mapping::MappingTable;
use crate::api::logs::JobLogger;
use crate::error::{ErrorKind, PipelineResult, RowError};
use crate::parser::{read_bytes, read_file, SourceFormat, Table};

/// Options for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub policy: BatchPolicy,
    /// Job id used to tag log entries; generated when absent.
    pub job_id: Option<Uuid>,
}

impl IngestOptions {
    pub fn with_policy(policy: BatchPolicy) -> Self {
        Self {
            policy,
            job_id: None,
        }
    }
}

/// Reader metadata for the ingested file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub format: SourceFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&Table> for TableInfo {
    fn from(table: &Table) -> Self {
        Self {
            format: table.format,
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            headers: table.headers.clone(),
            row_count: table.row_count(),
        }
    }
}

/// A row left out under [`BatchPolicy::SkipInvalid`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// Zero-based data row index.
    pub row: usize,
    pub kind: ErrorKind,
    pub error: String,
}

impl From<RowError> for SkippedRow {
    fn from(err: RowError) -> Self {
        Self {
            row: err.row,
            kind: err.kind(),
            error: err.source.to_string(),
        }
    }
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub job_id: Uuid,
    /// One object per transformed row, in input order.
    pub records: Vec<Value>,
    pub skipped: Vec<SkippedRow>,
    pub table: TableInfo,
    /// Header columns with no mapping; their values never reach `records`.
    pub unmapped_columns: Vec<String>,
}

/// Ingest a file from disk.
pub fn ingest_file<P: AsRef<Path>>(
    path: P,
    mappings: &MappingTable,
    options: IngestOptions,
) -> PipelineResult<IngestResult> {
    let table = read_file(path)?;
    ingest_table(table, mappings, options)
}

/// Ingest uploaded bytes; `file_name` selects the reader.
pub fn ingest_bytes(
    bytes: &[u8],
    file_name: &str,
    mappings: &MappingTable,
    options: IngestOptions,
) -> PipelineResult<IngestResult> {
    let table = read_bytes(bytes, file_name)?;
    ingest_table(table, mappings, options)
}

/// Transform an already-decoded table.
///
/// An empty table is a valid, empty result.
pub fn ingest_table(
    table: Table,
    mappings: &MappingTable,
    options: IngestOptions,
) -> PipelineResult<IngestResult> {
    let log = JobLogger::new(options.job_id.unwrap_or_else(Uuid::new_v4));
    let info = TableInfo::from(&table);

    log.info(format!("Reading {} input...", info.format));
    if let Some(ref encoding) = info.encoding {
        log.success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = info.delimiter {
        log.success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    log.success(format!(
        "Read {} rows, {} columns",
        info.row_count,
        info.headers.len()
    ));

    let unmapped_columns: Vec<String> = mappings
        .unmapped(&info.headers)
        .into_iter()
        .map(str::to_string)
        .collect();
    if !unmapped_columns.is_empty() {
        log.warning(format!(
            "{} column(s) without mapping will be ignored: {}",
            unmapped_columns.len(),
            unmapped_columns.join(", ")
        ));
    }

    log.info(format!(
        "Transforming with {} mapping(s), policy {}...",
        mappings.len(),
        options.policy
    ));
    let outcome = run_batch(&table.rows, mappings, options.policy).map_err(|e| {
        log.error(e.to_string());
        e
    })?;

    log.success(outcome.summary());
    for skipped in outcome.skipped.iter().take(5) {
        log.warning(skipped.to_string());
    }
    if outcome.skipped.len() > 5 {
        log.warning(format!("... +{} more skipped rows", outcome.skipped.len() - 5));
    }

    Ok(IngestResult {
        job_id: log.job_id(),
        records: outcome.records.into_iter().map(Value::from).collect(),
        skipped: outcome.skipped.into_iter().map(SkippedRow::from).collect(),
        table: info,
        unmapped_columns,
    })
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use serde_json::json;

    fn mappings() -> MappingTable {
        [
            ("USER_ID", "$.user.id"),
            ("USERNAME", "$.user.name"),
            ("ACTIVE", "$.user.active"),
            ("COI", "$.country"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_ingest_csv_bytes() {
        let csv = "USER_ID;USERNAME;ACTIVE;COI;NOTES\n42;bob;TRUE;US;vip\n007;alice;false;FR;\n";
        let result = ingest_bytes(csv.as_bytes(), "clients.csv", &mappings(), IngestOptions::default()).unwrap();

        assert_eq!(
            result.records,
            vec![
                json!({"user": {"id": 42, "name": "bob", "active": true}, "country": "US"}),
                json!({"user": {"id": 7, "name": "alice", "active": false}, "country": "FR"}),
            ]
        );
        assert_eq!(result.unmapped_columns, vec!["NOTES"]);
        assert_eq!(result.table.row_count, 2);
        assert_eq!(result.table.format, SourceFormat::Csv);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_empty_input_is_empty_result() {
        let result = ingest_bytes(b"", "empty.csv", &mappings(), IngestOptions::default()).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.table.row_count, 0);
    }

    #[test]
    fn test_fail_fast_reports_row() {
        let mut table = mappings();
        table.insert("BROKEN", "$.");
        let csv = "USER_ID;BROKEN\n1;\n2;x\n";
        let err = ingest_bytes(csv.as_bytes(), "x.csv", &table, IngestOptions::default()).unwrap_err();

        assert!(matches!(err, PipelineError::Row(_)));
        assert_eq!(err.row(), Some(0));
        assert_eq!(err.kind(), Some(ErrorKind::InvalidMapping));
    }

    #[test]
    fn test_skip_invalid_keeps_count() {
        let mut table = mappings();
        table.insert("BROKEN", "");
        let rows = vec![
            [("USER_ID", "1")].into_iter().map(|(k, v)| (k, crate::models::CellValue::text(v))).collect(),
            [("USER_ID", "2"), ("BROKEN", "x")]
                .into_iter()
                .map(|(k, v)| (k, crate::models::CellValue::text(v)))
                .collect(),
        ];
        let input = Table {
            headers: vec!["USER_ID".into(), "BROKEN".into()],
            rows,
            format: SourceFormat::Xlsx,
            encoding: None,
            delimiter: None,
        };

        let result = ingest_table(input, &table, IngestOptions::with_policy(BatchPolicy::SkipInvalid)).unwrap();
        assert_eq!(result.records, vec![json!({"user": {"id": 1}})]);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].row, 1);
        assert_eq!(result.skipped[0].kind, ErrorKind::InvalidMapping);
    }

    #[test]
    fn test_blank_row_keeps_its_index() {
        let csv = "USER_ID;COI\n1;US\n;\n3;FR\n";
        let result = ingest_bytes(csv.as_bytes(), "gaps.csv", &mappings(), IngestOptions::default()).unwrap();

        assert_eq!(result.table.row_count, 3);
        assert_eq!(
            result.records,
            vec![
                json!({"user": {"id": 1}, "country": "US"}),
                json!({"user": {"id": ""}, "country": ""}),
                json!({"user": {"id": 3}, "country": "FR"}),
            ]
        );

        let mut table = mappings();
        table.insert("BROKEN", "$.");
        let csv = "USER_ID;BROKEN\n1;a\n;\n3;c\n";
        let options = IngestOptions::with_policy(BatchPolicy::SkipInvalid);
        let result = ingest_bytes(csv.as_bytes(), "gaps.csv", &table, options).unwrap();
        let rows: Vec<usize> = result.skipped.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_ingest_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.csv");
        std::fs::write(&path, "COI\nUS\n").unwrap();

        let job = Uuid::new_v4();
        let options = IngestOptions { policy: BatchPolicy::FailFast, job_id: Some(job) };
        let result = ingest_file(&path, &mappings(), options).unwrap();
        assert_eq!(result.records, vec![json!({"country": "US"})]);
        assert_eq!(result.job_id, job);
    }

    #[test]
    fn test_unreadable_input() {
        let err = ingest_bytes(b"garbage", "upload.xlsx", &mappings(), IngestOptions::default()).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::UnreadableInput));
    }
}
