//! Upload pipeline: convert to PDF if needed, store the object, register the template

use std::sync::Arc;

use chrono::Utc;
use docsign_core::{StoreError, TemplateStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

use crate::convert::{ConvertError, DocumentConverter};
use crate::storage::{ObjectStore, StorageError};

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Template registration failed: {0}")]
    Store(#[from] StoreError),
}

/// Response body of a successful upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub message: String,
    pub filename: String,
    pub id: String,
    pub file_id: String,
}

/// Lowercased text after the last `.`; the whole name when there is no dot
pub fn extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// File name without its last extension
pub fn stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i + 1 < filename.len() && !filename[i + 1..].contains('/') => &filename[..i],
        _ => filename,
    }
}

/// MIME type sent to the converter for a convertible extension
pub fn mime_type(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "rtf" => "text/rtf",
        "html" | "htm" => "text/html",
        _ => return None,
    };
    Some(mime)
}

/// Stored object name: hex SHA-256 of `<unix_millis>-<stem>.pdf`, plus `.pdf`
pub fn object_name(filename: &str, unix_millis: i64) -> String {
    let digest = Sha256::digest(format!("{}-{}.pdf", unix_millis, stem(filename)).as_bytes());
    format!("{}.pdf", hex::encode(digest))
}

#[derive(Clone)]
pub struct UploadPipeline {
    converter: Arc<dyn DocumentConverter>,
    objects: Arc<dyn ObjectStore>,
    store: Arc<dyn TemplateStore>,
}

impl UploadPipeline {
    pub fn new(
        converter: Arc<dyn DocumentConverter>,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn TemplateStore>,
    ) -> Self {
        Self {
            converter,
            objects,
            store,
        }
    }

    /// Run one upload. Nothing is retried; a stored object is not removed when
    /// registering the template fails.
    pub async fn process(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, UploadError> {
        let ext = extension(filename);
        let pdf = if ext == "pdf" {
            bytes
        } else {
            let mime =
                mime_type(&ext).ok_or_else(|| UploadError::UnsupportedFormat(ext.clone()))?;
            self.converter.convert(bytes, mime).await?
        };

        let name = object_name(filename, Utc::now().timestamp_millis());
        let file_id = self.objects.put(&name, pdf, PDF_MIME).await?;

        let template = match self.store.create_template(&file_id).await {
            Ok(template) => template,
            Err(e) => {
                error!(
                    file_id = %file_id,
                    error = %e,
                    "Template insert failed; stored object is orphaned"
                );
                return Err(e.into());
            }
        };

        info!(
            template_id = %template.id,
            file_id = %file_id,
            original = filename,
            "Template uploaded"
        );
        Ok(UploadOutcome {
            message: "File uploaded and saved successfully".to_string(),
            filename: name,
            id: template.id,
            file_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FsObjectStore;
    use async_trait::async_trait;
    use docsign_core::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records what it was asked to convert and returns a fixed PDF
    #[derive(Default)]
    struct RecordingConverter {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentConverter for RecordingConverter {
        async fn convert(&self, _bytes: Vec<u8>, mime_type: &str) -> Result<Vec<u8>, ConvertError> {
            self.calls.lock().unwrap().push(mime_type.to_string());
            Ok(b"%PDF-1.4 converted".to_vec())
        }
    }

    fn is_object_name(name: &str) -> bool {
        name.len() == 68
            && name.ends_with(".pdf")
            && name[..64].chars().all(|c| c.is_ascii_hexdigit())
    }

    async fn pipeline(
        dir: &tempfile::TempDir,
    ) -> (UploadPipeline, Arc<RecordingConverter>, Arc<MemoryStore>) {
        let converter = Arc::new(RecordingConverter::default());
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(FsObjectStore::open(dir.path()).await.unwrap());
        (
            UploadPipeline::new(converter.clone(), objects, store.clone()),
            converter,
            store,
        )
    }

    #[test]
    fn test_extension_and_stem() {
        assert_eq!(extension("Contract.DOCX"), "docx");
        assert_eq!(extension("archive.tar.gz"), "gz");
        assert_eq!(extension("README"), "readme");
        assert_eq!(stem("contract.docx"), "contract");
        assert_eq!(stem("archive.tar.gz"), "archive.tar");
        assert_eq!(stem("README"), "README");
        assert_eq!(stem("trailing."), "trailing.");
    }

    #[test]
    fn test_convertible_extensions() {
        for ext in ["doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "rtf", "html", "htm"] {
            assert!(mime_type(ext).is_some(), "{} should convert", ext);
        }
        assert_eq!(mime_type("png"), None);
        assert_eq!(mime_type("pdf"), None);
    }

    #[test]
    fn test_object_name_hashes_stem_and_time() {
        let expected = format!(
            "{}.pdf",
            hex::encode(Sha256::digest(b"1700000000000-contract.pdf"))
        );
        assert_eq!(object_name("contract.docx", 1_700_000_000_000), expected);
        assert_eq!(object_name("contract.pdf", 1_700_000_000_000), expected);
        assert_ne!(object_name("contract.pdf", 1_700_000_000_001), expected);
        assert!(is_object_name(&expected));
    }

    #[tokio::test]
    async fn test_docx_is_converted_and_registered() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, converter, store) = pipeline(&dir).await;

        let outcome = pipeline
            .process("contract.docx", b"PK docx bytes".to_vec())
            .await
            .unwrap();

        assert!(is_object_name(&outcome.filename));
        assert_eq!(outcome.file_id, outcome.filename);
        assert_eq!(outcome.message, "File uploaded and saved successfully");
        assert_eq!(
            converter.calls.lock().unwrap().as_slice(),
            ["application/vnd.openxmlformats-officedocument.wordprocessingml.document"]
        );

        let template = store.get_template(&outcome.id).await.unwrap().unwrap();
        assert_eq!(template.file_id, outcome.file_id);
        let stored = std::fs::read(dir.path().join(&outcome.file_id)).unwrap();
        assert_eq!(stored, b"%PDF-1.4 converted".to_vec());
    }

    #[tokio::test]
    async fn test_pdf_bypasses_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, converter, _store) = pipeline(&dir).await;

        let outcome = pipeline
            .process("scan.PDF", b"%PDF-1.7 original".to_vec())
            .await
            .unwrap();
        assert!(converter.calls.lock().unwrap().is_empty());
        let stored = std::fs::read(dir.path().join(&outcome.file_id)).unwrap();
        assert_eq!(stored, b"%PDF-1.7 original".to_vec());
    }

    #[tokio::test]
    async fn test_unsupported_format_rejected_before_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, converter, _store) = pipeline(&dir).await;

        let err = pipeline
            .process("photo.png", vec![0x89, 0x50])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat(ref ext) if ext == "png"));
        assert!(converter.calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_object() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _converter, store) = pipeline(&dir).await;
        store.fail_writes(true);

        let err = pipeline
            .process("lease.pdf", b"%PDF".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Store(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
