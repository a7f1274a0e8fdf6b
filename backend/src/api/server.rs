//! HTTP server for the import API.
//!
//! One import transaction is held per server. Uploading a new file while a
//! preview is pending discards that preview first.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                          |
//! |--------|-----------------------|--------------------------------------|
//! | GET    | `/health`             | Health check                         |
//! | POST   | `/api/import`         | Upload a file, get a preview         |
//! | POST   | `/api/import/confirm` | Commit the held preview              |
//! | POST   | `/api/import/cancel`  | Discard the held preview             |
//! | GET    | `/api/dataset`        | Current schools and students         |
//! | GET    | `/api/backup`         | Dataset as a downloadable backup     |
//! | GET    | `/api/stats`          | Allocation statistics                |
//! | GET    | `/api/logs`           | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_warning, LOG_BROADCASTER};
use super::types::{error_response, ImportResponse};
use crate::allocation::{allocation_stats, AllocationStats};
use crate::config::Config;
use crate::error::{ServerError, ServerResult, TransactionError};
use crate::models::Dataset;
use crate::store::{backup, today_backup_file_name, FileStore};
use crate::transaction::{ImportOptions, ImportTransaction, TransactionState};

/// Everything a request may touch.
pub struct AppState {
    pub transaction: ImportTransaction,
    pub store: FileStore,
    pub options: ImportOptions,
    /// Id handed out with the current upload
    pub job_id: String,
}

pub type SharedState = Arc<Mutex<AppState>>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Transaction(TransactionError::Import(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Transaction(TransactionError::NoPreview | TransactionError::Busy) => {
                StatusCode::CONFLICT
            }
            ServerError::Transaction(TransactionError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the application router
pub fn app(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/import", post(upload))
        .route("/api/import/confirm", post(confirm))
        .route("/api/import/cancel", post(cancel))
        .route("/api/dataset", get(dataset))
        .route("/api/backup", get(download_backup))
        .route("/api/stats", get(stats))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(&config.store_path)?;
    let state = Arc::new(Mutex::new(AppState {
        transaction: ImportTransaction::new(),
        store,
        options: config.import_options(),
        job_id: String::new(),
    }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    eprintln!("🚀 Educa import server running on http://localhost:{}", config.port);
    eprintln!("   Store:   {}", config.store_path.display());
    eprintln!("   POST /api/import         - Upload CSV/JSON/Educacenso file");
    eprintln!("   POST /api/import/confirm - Commit preview");
    eprintln!("   POST /api/import/cancel  - Discard preview");
    eprintln!("   GET  /api/logs           - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "educa-import",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint: process a file into a preview
async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ServerResult<Json<ImportResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file = Some((name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    let mut guard = state.lock().await;
    let current = &mut *guard;

    if current.transaction.state() == TransactionState::Preview {
        log_warning("Pré-visualização anterior descartada");
        current.transaction.reset();
    }

    current.job_id = ImportResponse::new_job_id();
    let outcome = current
        .transaction
        .process(&file_name, &bytes, &mut current.store, current.options)?;

    Ok(Json(ImportResponse::from_outcome(current.job_id.clone(), outcome)))
}

async fn confirm(State(state): State<SharedState>) -> ServerResult<Json<ImportResponse>> {
    let mut guard = state.lock().await;
    let current = &mut *guard;

    let summary = current.transaction.confirm(&mut current.store)?;
    Ok(Json(ImportResponse::committed(current.job_id.clone(), summary)))
}

async fn cancel(State(state): State<SharedState>) -> ServerResult<Json<ImportResponse>> {
    let mut guard = state.lock().await;
    guard.transaction.cancel()?;
    Ok(Json(ImportResponse::cancelled(guard.job_id.clone())))
}

async fn dataset(State(state): State<SharedState>) -> Json<Dataset> {
    let guard = state.lock().await;
    Json(guard.store.dataset().clone())
}

async fn download_backup(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    let data = backup(&guard.store);
    let file_name = today_backup_file_name();
    log_info(format!("Backup exportado: {}", file_name));

    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )],
        Json(data),
    )
}

async fn stats(State(state): State<SharedState>) -> Json<AllocationStats> {
    let guard = state.lock().await;
    Json(allocation_stats(guard.store.dataset().students.as_slice()))
}
