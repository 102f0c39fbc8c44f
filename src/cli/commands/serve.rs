//! HTTP API server.
//!
//! Accepts a video upload as `multipart/form-data` and answers with the
//! generated cover image. Fields:
//!
//! - `file`: the video (required)
//! - `style`: free-form visual style (optional, defaults to empty)
//! - `color`: free-form dominant color (optional, defaults to empty)
//!
//! Failures come back as JSON naming the stage and error kind.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{ErrorKind, OmslagError, PipelineError};
use crate::orchestrator::{Orchestrator, StylePreferences};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

/// Shared application state.
struct AppState {
    orchestrator: Arc<Orchestrator>,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    let max_upload = settings.server.max_upload_bytes();
    let orchestrator = Arc::new(Orchestrator::new(settings)?);
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Omslag API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Cover", "POST /process (multipart: file, style, color)");
    Output::kv("Summary", "POST /summarize (multipart: file)");
    Output::kv("Max upload", &crate::cli::output::format_bytes(max_upload as u64));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router around an orchestrator.
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let max_upload = orchestrator.settings().server.max_upload_bytes();
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/process", post(process))
        .route("/summarize", post(summarize))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    preferences: StylePreferences,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
}

/// Error returned by the handlers.
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// A request rejected before any stage ran.
    fn rejected(status: StatusCode, err: OmslagError) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: err.to_string(),
                kind: err.kind().to_string(),
                stage: None,
            },
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::rejected(StatusCode::BAD_REQUEST, OmslagError::InvalidInput(message.into()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::rejected(err.status(), OmslagError::InvalidInput(err.body_text()))
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            body: ErrorResponse {
                error: err.to_string(),
                kind: err.kind().to_string(),
                stage: Some(err.stage.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    debug!(
        "Cover request for {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    let cover = state
        .orchestrator
        .process(&upload.bytes, &upload.filename, &upload.preferences)
        .await
        .inspect_err(|e| warn!("Cover request failed: {}", e))?;

    let headers = [
        (header::CONTENT_TYPE, cover.content_type.to_string()),
        (HeaderName::from_static("x-request-id"), cover.request_id.to_string()),
    ];
    Ok((StatusCode::OK, headers, cover.bytes).into_response())
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SummaryResponse>, ApiError> {
    let upload = read_upload(multipart).await?;

    let summary = state
        .orchestrator
        .summarize_video(&upload.bytes, &upload.filename)
        .await
        .inspect_err(|e| warn!("Summary request failed: {}", e))?;

    Ok(Json(SummaryResponse { summary }))
}

/// Collect the upload and style fields from a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut file = None;
    let mut preferences = StylePreferences::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("style") => preferences.style = field.text().await?,
            Some("color") => preferences.color = field.text().await?,
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::bad_request("missing 'file' field"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("uploaded file is empty"));
    }

    Ok(Upload {
        filename,
        bytes,
        preferences,
    })
}
