use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use monitor::{
    FileStatusReport, IngestionService, MetricsSnapshot, MonitoringStatus, StartOutcome,
    StopOutcome,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestionService>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    monitoring: bool,
}

#[derive(Serialize)]
struct ControlResponse {
    success: bool,
    message: String,
}

#[derive(Deserialize)]
struct ResetRequest {
    filename: Option<String>,
}

#[derive(Serialize)]
struct ResetResponse {
    success: bool,
    reset: usize,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    summary: String,
    filename: String,
    word_count: usize,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_document))
        .route("/monitoring/start", post(start_monitoring))
        .route("/monitoring/stop", post(stop_monitoring))
        .route("/monitoring/status", get(monitoring_status))
        .route("/files/status", get(list_file_statuses))
        .route("/files/reset", post(reset_status))
        .route("/stats", get(get_stats))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        monitoring: state.service.is_active().await,
    })
}

fn control(status: StatusCode, success: bool, message: &str) -> (StatusCode, Json<ControlResponse>) {
    (
        status,
        Json(ControlResponse {
            success,
            message: message.to_string(),
        }),
    )
}

async fn start_monitoring(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ControlResponse>), ApiError> {
    let outcome = state.service.start_monitoring().await.map_err(|e| {
        tracing::error!("Failed to start monitoring: {:#}", e);
        ApiError::Internal("Failed to start monitoring".to_string())
    })?;

    Ok(match outcome {
        StartOutcome::Started => control(StatusCode::OK, true, "Monitoring started"),
        StartOutcome::AlreadyRunning => {
            control(StatusCode::CONFLICT, false, "Monitoring is already active")
        }
        StartOutcome::Stopping => {
            control(StatusCode::CONFLICT, false, "Monitoring is still stopping")
        }
    })
}

async fn stop_monitoring(State(state): State<AppState>) -> (StatusCode, Json<ControlResponse>) {
    match state.service.stop_monitoring().await {
        StopOutcome::Stopped => control(StatusCode::OK, true, "Monitoring stopped"),
        StopOutcome::TimedOut => control(
            StatusCode::OK,
            true,
            "Monitoring stopped after the watcher exceeded the stop timeout",
        ),
        StopOutcome::NotRunning => control(StatusCode::CONFLICT, false, "Monitoring is not active"),
    }
}

async fn monitoring_status(State(state): State<AppState>) -> Json<MonitoringStatus> {
    Json(state.service.status().await)
}

async fn list_file_statuses(State(state): State<AppState>) -> Json<FileStatusReport> {
    Json(state.service.list_file_statuses().await)
}

/// An empty body resets every file; anything else must be a JSON
/// `{"filename": ...}` object
async fn reset_status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResetResponse>, ApiError> {
    let filename = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let req: ResetRequest = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("Invalid reset request: {}", e)))?;
        req.filename
    };
    let reset = state.service.reset_status(filename.as_deref()).await?;

    Ok(Json(ResetResponse {
        success: true,
        reset,
    }))
}

async fn get_stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.metrics())
}

/// Summarize an uploaded document without involving the watcher
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Invalid upload: {}", e)))?;
            upload = Some((filename, data));
            break;
        }
    }

    let (raw_name, data) = upload.ok_or_else(|| ApiError::Validation("No file uploaded".to_string()))?;
    let filename = sanitize_filename(&raw_name);
    if filename.is_empty() {
        return Err(ApiError::Validation("No file selected".to_string()));
    }
    if !ingest::is_supported(Path::new(&filename)) {
        return Err(ApiError::Validation(
            "Invalid file type. Please upload PDF or DOCX files only.".to_string(),
        ));
    }

    // Save uploaded file temporarily
    let temp_path = std::env::temp_dir().join(format!("{}_{}", Uuid::new_v4(), filename));
    tokio::fs::write(&temp_path, &data).await.map_err(|e| {
        tracing::error!("Failed to save upload {}: {}", temp_path.display(), e);
        ApiError::Internal("An error occurred while processing the file".to_string())
    })?;

    let result = state.service.summarize_upload(&temp_path, &filename).await;

    if let Err(e) = tokio::fs::remove_file(&temp_path).await {
        tracing::warn!("Failed to remove temporary file {}: {}", temp_path.display(), e);
    }

    let document = result?;
    Ok(Json(UploadResponse {
        success: true,
        summary: document.summary,
        filename,
        word_count: document.word_count,
    }))
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]`
fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}
