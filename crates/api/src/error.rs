use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ingest::ExtractError;
use monitor::{LedgerError, ProcessError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Internal server error")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Extraction(ExtractError::NoText(_)) => {
                Self::Validation("No text could be extracted from the file".to_string())
            }
            ProcessError::Extraction(ExtractError::Unsupported(_)) => Self::Validation(
                "Invalid file type. Please upload PDF or DOCX files only.".to_string(),
            ),
            ProcessError::Summarization(_) => {
                tracing::error!("Summarization error: {}", err);
                Self::Internal("Failed to generate summary".to_string())
            }
            _ => {
                tracing::error!("Error processing file: {}", err);
                Self::Internal("An error occurred while processing the file".to_string())
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(name) => Self::NotFound(format!("File not tracked: {}", name)),
            other => {
                tracing::error!("Ledger error: {}", other);
                Self::Internal("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    success: bool,
    error: String,
}
