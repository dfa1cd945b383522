use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Storage access failed: {0}")]
    StorageError(#[from] StorageError),

    #[error("Knowledge index unavailable: {0}")]
    IndexError(String),

    #[error("Service temporarily unavailable: {0}")]
    ResourceError(String),
}

/// Failure reading or writing one document in the document store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read {bucket}/{key}: {source}")]
    Read {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {bucket}/{key}: {source}")]
    Write {
        bucket: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{bucket}/{key} could not be decoded: {source}")]
    Decode {
        bucket: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid object key '{0}'")]
    InvalidKey(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::StorageError(e) => {
                tracing::error!(error = %e, "Storage error");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::IndexError(msg) => {
                tracing::error!(error = %msg, "Knowledge index error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ResourceError(msg) => {
                tracing::warn!(error = %msg, "Resource error");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
