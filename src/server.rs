//! JSON HTTP API over a shared [`SimilarityIndex`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/stats` | Record counts by content type |
//! | `POST` | `/query` | Nearest examples for `{query, k?, filter?}` |
//! | `POST` | `/draft` | Generated draft for `{query, k?, filter?, style?}` |
//! | `GET`  | `/corpus` | Corpus files with their metadata and chunk counts |
//! | `POST` | `/ingest` | Re-chunk the corpus and replace every document |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "configuration", "message": "unknown filter key: author" } }
//! ```
//!
//! | Code | Status |
//! |------|--------|
//! | `bad_request`, `configuration` | 400 |
//! | `embedding_provider`, `generation` | 502 |
//! | `index_storage`, `file_read`, `internal` | 500 |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use voiceprint_core::chunk::Chunker;
use voiceprint_core::filter::{FilterSpec, MetadataFilter};
use voiceprint_core::models::{CollectionStats, ContentType, QueryHit};
use voiceprint_core::Error;

use crate::assistant::{Draft, WritingAssistant};
use crate::config::{Config, CorpusConfig};
use crate::generation::create_generator;
use crate::index::{open_index, SimilarityIndex};
use crate::ingest::{index_documents, process_directory, IngestReport};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    index: Arc<SimilarityIndex>,
    assistant: Arc<WritingAssistant>,
    corpus: Arc<CorpusConfig>,
    chunker: Chunker,
}

impl AppState {
    pub fn new(
        index: Arc<SimilarityIndex>,
        assistant: Arc<WritingAssistant>,
        corpus: CorpusConfig,
        chunker: Chunker,
    ) -> Self {
        Self {
            index,
            assistant,
            corpus: Arc::new(corpus),
            chunker,
        }
    }

    /// Walk the corpus off the async runtime.
    async fn scan_corpus(&self) -> Result<IngestReport, AppError> {
        let chunker = self.chunker.clone();
        let corpus = self.corpus.clone();
        let report = tokio::task::spawn_blocking(move || process_directory(&chunker, &corpus))
            .await
            .map_err(|e| internal(format!("corpus scan aborted: {}", e)))??;
        Ok(report)
    }
}

/// Build the router. Split out from [`run_server`] so tests can serve it
/// on an ephemeral port.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/query", post(handle_query))
        .route("/draft", post(handle_draft))
        .route("/corpus", get(handle_corpus))
        .route("/ingest", post(handle_ingest))
        .layer(cors)
        .with_state(state)
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let index = Arc::new(open_index(config).await?);
    let generator = create_generator(&config.generation)?;
    let assistant = Arc::new(WritingAssistant::new(
        index.clone(),
        generator,
        config.generation.top_k,
    ));
    let chunker = Chunker::new(config.chunking)?;
    let app = build_router(AppState::new(
        index,
        assistant,
        config.corpus.clone(),
        chunker,
    ));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Configuration(_) => StatusCode::BAD_REQUEST,
            Error::EmbeddingProvider { .. } | Error::Generation { .. } => StatusCode::BAD_GATEWAY,
            Error::IndexStorage { .. } | Error::FileRead { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status != StatusCode::BAD_REQUEST {
            warn!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn parse_filter(filter: Option<FilterSpec>) -> Result<Option<MetadataFilter>, AppError> {
    Ok(filter.map(FilterSpec::into_filter).transpose()?)
}

fn require_query(query: &str) -> Result<(), AppError> {
    if query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<CollectionStats>, AppError> {
    Ok(Json(state.index.stats().await?))
}

// ============ POST /query ============

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub filter: Option<FilterSpec>,
}

#[derive(Serialize)]
struct QueryResponse {
    results: Vec<QueryHit>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    require_query(&req.query)?;
    let filter = parse_filter(req.filter)?;
    let k = req.k.unwrap_or(state.assistant.top_k());
    let results = state.index.query(&req.query, k, filter.as_ref()).await?;
    Ok(Json(QueryResponse { results }))
}

// ============ POST /draft ============

#[derive(Deserialize)]
pub struct DraftRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub filter: Option<FilterSpec>,
    #[serde(default)]
    pub style: Option<String>,
}

async fn handle_draft(
    State(state): State<AppState>,
    Json(req): Json<DraftRequest>,
) -> Result<Json<Draft>, AppError> {
    require_query(&req.query)?;
    let filter = parse_filter(req.filter)?;
    let draft = state
        .assistant
        .draft(&req.query, req.k, filter.as_ref(), req.style.as_deref())
        .await?;
    Ok(Json(draft))
}

// ============ GET /corpus ============

#[derive(Serialize)]
struct CorpusFile {
    source_file: String,
    title: String,
    tags: Vec<String>,
    content_type: Option<ContentType>,
    chunks: usize,
}

#[derive(Serialize)]
struct CorpusResponse {
    files: Vec<CorpusFile>,
    failed: Vec<String>,
}

async fn handle_corpus(State(state): State<AppState>) -> Result<Json<CorpusResponse>, AppError> {
    let report = state.scan_corpus().await?;
    let files = report
        .documents
        .into_iter()
        .map(|doc| {
            let first = doc.chunks.first().map(|c| &c.metadata);
            CorpusFile {
                title: first.map(|m| m.title.clone()).unwrap_or_default(),
                tags: first.map(|m| m.tags.clone()).unwrap_or_default(),
                content_type: first.and_then(|m| m.content_type),
                chunks: doc.chunks.len(),
                source_file: doc.source_file,
            }
        })
        .collect();
    let failed = report
        .failures
        .iter()
        .map(|f| f.path.display().to_string())
        .collect();
    Ok(Json(CorpusResponse { files, failed }))
}

// ============ POST /ingest ============

#[derive(Serialize)]
struct IngestResponse {
    documents: usize,
    failed: usize,
    chunks_written: usize,
}

async fn handle_ingest(State(state): State<AppState>) -> Result<Json<IngestResponse>, AppError> {
    if !state.index.embedder().is_enabled() {
        return Err(Error::config("ingest requires embeddings; set [embedding].provider").into());
    }
    let report = state.scan_corpus().await?;
    let documents = report.documents.len();
    let failed = report.failures.len();
    let chunks_written = index_documents(&state.index, report.documents)
        .await
        .map_err(|e| match e.downcast::<Error>() {
            Ok(err) => AppError::from(err),
            Err(other) => internal(format!("{:#}", other)),
        })?;
    info!(documents, failed, chunks_written, "reingested corpus");
    Ok(Json(IngestResponse {
        documents,
        failed,
        chunks_written,
    }))
}
