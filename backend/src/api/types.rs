//! REST API request and response types.
//!
//! Field names are camelCase on the wire.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::logs::log_error;
use crate::error::{ErrorKind, PipelineError, ServerError, StoreError};
use crate::parser::SourceFormat;
use crate::store::{PageRequest, SortDirection, SortField};
use crate::transform::pipeline::{IngestResult, SkippedRow};
use crate::transform::BatchPolicy;

/// Response sent after an upload has been transformed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: Uuid,
    /// `"ready"`, or `"warning"` when rows were skipped or columns unmapped.
    pub status: String,
    /// One nested object per accepted row.
    pub records: Vec<Value>,
    pub metadata: UploadMetadata,
}

/// Metadata about the upload and its transformation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub file_name: String,
    pub format: SourceFormat,
    pub encoding: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub unmapped_columns: Vec<String>,
    pub transformed: usize,
    pub skipped: Vec<SkippedRow>,
}

impl UploadResponse {
    pub fn new(file_name: impl Into<String>, result: IngestResult) -> Self {
        let warning = !result.skipped.is_empty() || !result.unmapped_columns.is_empty();

        UploadResponse {
            job_id: result.job_id,
            status: if warning { "warning" } else { "ready" }.to_string(),
            metadata: UploadMetadata {
                file_name: file_name.into(),
                format: result.table.format,
                encoding: result.table.encoding,
                row_count: result.table.row_count,
                columns: result.table.headers,
                unmapped_columns: result.unmapped_columns,
                transformed: result.records.len(),
                skipped: result.skipped,
            },
            records: result.records,
        }
    }
}

/// Query of `POST /api/excel/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    /// Overrides the configured batch policy.
    pub policy: Option<BatchPolicy>,
}

/// Query of the search endpoints: a substring plus paging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
}

impl SearchQuery {
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            size: self.size.unwrap_or(defaults.size),
            sort_by: self.sort_by.unwrap_or(defaults.sort_by),
            sort_direction: self.sort_direction.unwrap_or(defaults.sort_direction),
        }
    }
}

/// Build an error body.
pub fn error_response(error: &str, kind: Option<ErrorKind>, row: Option<usize>) -> Value {
    let mut body = json!({
        "status": "error",
        "error": error,
    });
    if let Some(kind) = kind {
        body["kind"] = json!(kind);
    }
    if let Some(row) = row {
        body["row"] = json!(row);
    }
    body
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::Reader(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Row(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Store(e)) | ServerError::Store(e) => store_status(e),
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServerError::Pipeline(e) => e.kind(),
            ServerError::Store(StoreError::InvalidPath { .. }) => Some(ErrorKind::InvalidMapping),
            _ => None,
        }
    }

    fn row(&self) -> Option<usize> {
        match self {
            ServerError::Pipeline(e) => e.row(),
            _ => None,
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::BlankColumn | StoreError::InvalidPath { .. } => StatusCode::BAD_REQUEST,
        StoreError::Io(_) | StoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_error(self.to_string());
        }
        let body = error_response(&self.to_string(), self.kind(), self.row());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PathError, ReaderError, RowError, TransformError};
    use crate::parser::Table;
    use crate::transform::pipeline::{ingest_table, IngestOptions};
    use crate::transform::MappingTable;

    fn row_error(row: usize) -> RowError {
        RowError {
            row,
            source: TransformError::InvalidMapping {
                column: "A".into(),
                path: "".into(),
                reason: PathError::Empty,
            },
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServerError::from(PipelineError::from(ReaderError::NoWorksheet)), StatusCode::BAD_REQUEST),
            (ServerError::from(PipelineError::from(row_error(3))), StatusCode::UNPROCESSABLE_ENTITY),
            (ServerError::from(StoreError::NotFound(9)), StatusCode::NOT_FOUND),
            (ServerError::from(StoreError::BlankColumn), StatusCode::BAD_REQUEST),
            (ServerError::BadRequest("no file".into()), StatusCode::BAD_REQUEST),
            (ServerError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{}", err);
        }
    }

    #[test]
    fn test_row_error_body() {
        let err = ServerError::from(PipelineError::from(row_error(3)));
        let body = error_response(&err.to_string(), err.kind(), err.row());
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "InvalidMapping");
        assert_eq!(body["row"], 3);
    }

    #[test]
    fn test_plain_error_body_has_no_kind() {
        let body = error_response("No file provided", None, None);
        assert_eq!(body, json!({"status": "error", "error": "No file provided"}));
    }

    #[test]
    fn test_upload_response_status() {
        let table = Table {
            headers: vec!["COI".into(), "NOTES".into()],
            rows: Vec::new(),
            format: SourceFormat::Csv,
            encoding: Some("utf-8".into()),
            delimiter: Some(';'),
        };
        let mappings: MappingTable = [("COI", "$.country")].into_iter().collect();
        let result = ingest_table(table, &mappings, IngestOptions::default()).unwrap();

        let response = UploadResponse::new("clients.csv", result);
        assert_eq!(response.status, "warning");
        assert_eq!(response.metadata.unmapped_columns, vec!["NOTES"]);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["metadata"]["fileName"], "clients.csv");
        assert_eq!(value["metadata"]["format"], "csv");
        assert!(value["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_search_query_defaults() {
        let query: SearchQuery = serde_json::from_value(json!({"q": "user"})).unwrap();
        let request = query.page_request();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, 10);
        assert_eq!(request.sort_direction, SortDirection::Desc);
    }
}
