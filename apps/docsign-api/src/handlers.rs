//! HTTP handlers for DocSign API

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    Json,
};
use docsign_core::{validate_annotation, PdfDocument};
use shared_types::{AnnotationRecord, PageInfo, Signatory, Template};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;
use crate::upload::{UploadOutcome, PDF_MIME};

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Accept a document in the `file` field and turn it into a template
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Error reading upload: {}", e);
        ApiError::Processing
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::error!("Error reading upload: {}", e);
            ApiError::Processing
        })?;
        file = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = file.ok_or(ApiError::NoFile)?;

    let outcome = state
        .uploads
        .process(&filename, bytes)
        .await
        .map_err(|e| {
            tracing::error!("Error processing file {}: {}", filename, e);
            ApiError::Processing
        })?;

    Ok(Json(outcome))
}

async fn load_template(state: &AppState, id: &str) -> Result<Template, ApiError> {
    state
        .store
        .get_template(id)
        .await?
        .ok_or_else(|| ApiError::TemplateNotFound(id.to_string()))
}

async fn load_document(state: &AppState, template: &Template) -> Result<PdfDocument, ApiError> {
    let bytes = state.objects.get(&template.file_id).await?;
    PdfDocument::from_bytes(&bytes).map_err(|e| ApiError::InvalidDocument(e.to_string()))
}

/// Get template by ID
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(load_template(&state, &id).await?))
}

/// Stored PDF of a template
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, [(header::HeaderName, String); 2], Vec<u8>), ApiError> {
    let template = load_template(&state, &id).await?;
    let bytes = state.objects.get(&template.file_id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, PDF_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", template.file_id),
            ),
        ],
        bytes,
    ))
}

/// Native size of every page, for laying out the editor
pub async fn get_pages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PageInfo>>, ApiError> {
    let template = load_template(&state, &id).await?;
    let document = load_document(&state, &template).await?;
    let pages = document
        .page_sizes()
        .map_err(|e| ApiError::InvalidDocument(e.to_string()))?;
    Ok(Json(pages))
}

pub async fn list_signatories(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Signatory>>, ApiError> {
    load_template(&state, &id).await?;
    Ok(Json(state.store.list_signatories(&id).await?))
}

/// Attach signatories to a template
pub async fn create_signatories(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CreateSignatoriesRequest>,
) -> Result<Json<Vec<Signatory>>, ApiError> {
    if req.signatories.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Please add at least one signatory.".into(),
        ));
    }
    for signatory in &req.signatories {
        signatory
            .validate()
            .map_err(|msg| ApiError::InvalidRequest(msg.into()))?;
    }

    let created = state.store.insert_signatories(&id, req.signatories).await?;
    Ok(Json(created))
}

pub async fn list_annotations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AnnotationRecord>>, ApiError> {
    load_template(&state, &id).await?;
    Ok(Json(state.store.list_annotations(&id).await?))
}

/// Save the editor's areas as one batch: rows without a stored id are created,
/// the rest updated. Updates must name rows already stored under this template.
/// Rows missing from the batch are left alone.
pub async fn save_annotations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SaveAnnotationsRequest>,
) -> Result<Json<Vec<AnnotationRecord>>, ApiError> {
    let template = load_template(&state, &id).await?;
    let page_count = load_document(&state, &template).await?.page_count();
    let signatories: HashSet<String> = state
        .store
        .list_signatories(&id)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let annotations: HashSet<String> = state
        .store
        .list_annotations(&id)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    let mut rows = Vec::with_capacity(req.annotations.len());
    for input in req.annotations {
        let row = input.into_upsert(&template.id);
        validate_annotation(&row, page_count)
            .map_err(|msg| ApiError::InvalidRequest(msg.into()))?;
        if let Some(annotation_id) = &row.id {
            if !annotations.contains(annotation_id) {
                return Err(ApiError::InvalidRequest(format!(
                    "Unknown annotation: {}",
                    annotation_id
                )));
            }
        }
        if let Some(signatory_id) = &row.signatory_id {
            if !signatories.contains(signatory_id) {
                return Err(ApiError::InvalidRequest(format!(
                    "Unknown signatory: {}",
                    signatory_id
                )));
            }
        }
        rows.push(row);
    }

    let count = rows.len();
    let saved = state.store.upsert_annotations(rows).await?;
    tracing::info!("Saved {} annotations for template {}", count, template.id);
    Ok(Json(saved))
}
