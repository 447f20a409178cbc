//! Error types for DocSign API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docsign_core::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    /// Any upload failure after the request was read
    #[error("Error processing file")]
    Processing,

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Stored document is unreadable: {0}")]
    InvalidDocument(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NoFile => (StatusCode::BAD_REQUEST, "No file uploaded".to_string()),
            ApiError::Processing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing file".to_string(),
            ),
            ApiError::TemplateNotFound(id) | ApiError::Store(StoreError::TemplateNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Template not found: {}", id))
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Store(e @ StoreError::ForeignAnnotation { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::InvalidDocument(e) => {
                tracing::error!("Unreadable document: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Stored document is not a readable PDF".to_string(),
                )
            }
            ApiError::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Storage(StorageError::NotFound(path)) => {
                tracing::error!("Template document missing from storage: {}", path);
                (StatusCode::NOT_FOUND, "Document not found".to_string())
            }
            ApiError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NoFile, StatusCode::BAD_REQUEST),
            (ApiError::Processing, StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::TemplateNotFound("t".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Store(StoreError::TemplateNotFound("t".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Store(StoreError::ForeignAnnotation {
                    id: "a1".into(),
                    template_id: "t".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Storage(StorageError::NotFound("x.pdf".into())),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
