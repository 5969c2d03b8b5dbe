//! HTTP server for the sheetmap API.
//!
//! # API Endpoints
//!
//! | Method | Path                                          | Description                     |
//! |--------|-----------------------------------------------|---------------------------------|
//! | GET    | `/health`                                     | Health check                    |
//! | GET    | `/api/logs`                                   | SSE stream for real-time logs   |
//! | POST   | `/api/excel/upload`                           | Upload a spreadsheet            |
//! | GET    | `/api/column-mappings`                        | List all mappings               |
//! | POST   | `/api/column-mappings`                        | Create a mapping                |
//! | DELETE | `/api/column-mappings`                        | Delete all mappings             |
//! | GET    | `/api/column-mappings/paginated`              | One page of mappings            |
//! | GET    | `/api/column-mappings/{id}`                   | One mapping                     |
//! | PUT    | `/api/column-mappings/{id}`                   | Update a mapping                |
//! | DELETE | `/api/column-mappings/{id}`                   | Delete a mapping                |
//! | GET    | `/api/column-mappings/search/{field}?q=`      | Paged substring search          |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, JobLogger, LOG_BROADCASTER};
use super::types::{SearchQuery, UploadQuery, UploadResponse};
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::models::{ColumnMapping, MappingRequest};
use crate::store::{MappingStore, Page, PageRequest, SearchField};
use crate::transform::pipeline::{ingest_bytes, IngestOptions};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<MappingStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: MappingStore, config: Config) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/logs", get(sse_logs))
        .route("/api/excel/upload", post(upload))
        .route(
            "/api/column-mappings",
            get(list_mappings).post(create_mapping).delete(delete_all_mappings),
        )
        .route("/api/column-mappings/paginated", get(paginated_mappings))
        .route(
            "/api/column-mappings/{id}",
            get(get_mapping).put(update_mapping).delete(delete_mapping),
        )
        .route("/api/column-mappings/search/{field}", get(search_mappings))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Open the mapping store and serve until the process exits.
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = MappingStore::open(&config.store_dir)?;
    let addr = config.bind_addr();

    log_info(format!(
        "Loaded {} column mapping(s) from {}",
        store.count(),
        store.dir().display()
    ));

    let state = AppState::new(store, config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log_info(format!("Sheetmap server running on http://{}", addr));
    log_info("   POST /api/excel/upload    - Upload a spreadsheet");
    log_info("   *    /api/column-mappings - Manage column mappings");
    log_info("   GET  /api/logs            - SSE log stream");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    let mappings = state.store.read().await.count();
    Json(json!({
        "status": "ok",
        "service": "sheetmap",
        "version": env!("CARGO_PKG_VERSION"),
        "mappings": mappings,
        "batchPolicy": state.config.batch_policy,
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers drop the missed entries.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: multipart field `file`, optional `?policy=`.
async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.xlsx").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        file = Some((name, bytes.to_vec()));
    }

    let (file_name, bytes) = file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    let log = JobLogger::new(uuid::Uuid::new_v4());
    log.info(format!("New upload: {} ({} bytes)", file_name, bytes.len()));

    // Mapping changes made during the run do not affect it.
    let mappings = state.store.read().await.mapping_table();
    let options = IngestOptions {
        policy: query.policy.unwrap_or(state.config.batch_policy),
        job_id: Some(log.job_id()),
    };

    let name = file_name.clone();
    let result = tokio::task::spawn_blocking(move || ingest_bytes(&bytes, &name, &mappings, options))
        .await
        .map_err(|e| ServerError::Internal(format!("Ingestion task failed: {}", e)))??;

    Ok(Json(UploadResponse::new(file_name, result)))
}

async fn list_mappings(State(state): State<AppState>) -> Json<Vec<ColumnMapping>> {
    let store = state.store.read().await;
    Json(store.list().into_iter().cloned().collect())
}

async fn paginated_mappings(
    State(state): State<AppState>,
    Query(request): Query<PageRequest>,
) -> Json<Page<ColumnMapping>> {
    Json(state.store.read().await.page(&request))
}

async fn get_mapping(State(state): State<AppState>, Path(id): Path<u64>) -> ServerResult<Json<ColumnMapping>> {
    let store = state.store.read().await;
    let mapping = store.get(id).cloned().ok_or(crate::error::StoreError::NotFound(id))?;
    Ok(Json(mapping))
}

async fn create_mapping(
    State(state): State<AppState>,
    Json(request): Json<MappingRequest>,
) -> ServerResult<(StatusCode, Json<ColumnMapping>)> {
    let created = state.store.write().await.create(request)?;
    log_info(format!(
        "Created mapping {}: {} -> {}",
        created.id, created.main_column_name, created.json_path
    ));
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_mapping(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<MappingRequest>,
) -> ServerResult<Json<ColumnMapping>> {
    let updated = state.store.write().await.update(id, request)?;
    Ok(Json(updated))
}

async fn delete_mapping(State(state): State<AppState>, Path(id): Path<u64>) -> ServerResult<StatusCode> {
    state.store.write().await.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_mappings(State(state): State<AppState>) -> ServerResult<StatusCode> {
    let removed = state.store.write().await.delete_all()?;
    log_info(format!("Deleted {} mapping(s)", removed));
    Ok(StatusCode::NO_CONTENT)
}

async fn search_mappings(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ServerResult<Json<Page<ColumnMapping>>> {
    let field: SearchField = field.parse().map_err(ServerError::BadRequest)?;
    let store = state.store.read().await;
    Ok(Json(store.search(field, &query.q, &query.page_request())))
}
