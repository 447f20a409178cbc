//! Persistence seam for templates, signatories and annotations
//!
//! The service backs this with sqlite; [`MemoryStore`] backs it in tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared_types::{AnnotationRecord, AnnotationUpsert, NewSignatory, Signatory, Template};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Annotation {id} does not belong to template {template_id}")]
    ForeignAnnotation { id: String, template_id: String },

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Remote tables used by the upload flow and the annotation editor.
///
/// No transactional guarantee is assumed across tables.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Register an uploaded PDF by its object-store path
    async fn create_template(&self, file_id: &str) -> Result<Template, StoreError>;

    async fn get_template(&self, id: &str) -> Result<Option<Template>, StoreError>;

    async fn insert_signatories(
        &self,
        template_id: &str,
        rows: Vec<NewSignatory>,
    ) -> Result<Vec<Signatory>, StoreError>;

    async fn list_signatories(&self, template_id: &str) -> Result<Vec<Signatory>, StoreError>;

    async fn list_annotations(
        &self,
        template_id: &str,
    ) -> Result<Vec<AnnotationRecord>, StoreError>;

    /// Create rows without an id and update rows with one, in a single batch.
    ///
    /// Returns the stored records in the same order as `rows`. An update whose id
    /// is stored under a different template fails the whole batch.
    async fn upsert_annotations(
        &self,
        rows: Vec<AnnotationUpsert>,
    ) -> Result<Vec<AnnotationRecord>, StoreError>;
}

#[derive(Default)]
struct Tables {
    templates: Vec<Template>,
    signatories: Vec<Signatory>,
    annotations: Vec<AnnotationRecord>,
    upsert_batches: Vec<Vec<AnnotationUpsert>>,
}

/// In-memory [`TemplateStore`] with switchable failures
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every list/get call fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every insert/upsert call fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Every batch passed to `upsert_annotations`, in call order
    pub fn upsert_batches(&self) -> Vec<Vec<AnnotationUpsert>> {
        self.lock().upsert_batches.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read failure injected".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write failure injected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create_template(&self, file_id: &str) -> Result<Template, StoreError> {
        self.check_write()?;
        let template = Template {
            id: Uuid::new_v4().to_string(),
            file_id: file_id.to_string(),
            created_at: Utc::now(),
        };
        self.lock().templates.push(template.clone());
        Ok(template)
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, StoreError> {
        self.check_read()?;
        Ok(self.lock().templates.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_signatories(
        &self,
        template_id: &str,
        rows: Vec<NewSignatory>,
    ) -> Result<Vec<Signatory>, StoreError> {
        self.check_write()?;
        let mut tables = self.lock();
        if !tables.templates.iter().any(|t| t.id == template_id) {
            return Err(StoreError::TemplateNotFound(template_id.to_string()));
        }

        let created: Vec<Signatory> = rows
            .into_iter()
            .map(|row| Signatory {
                id: Uuid::new_v4().to_string(),
                created_at: Utc::now(),
                name: Some(row.name),
                email: Some(row.email),
                phone: Some(row.phone),
                template_id: Some(template_id.to_string()),
            })
            .collect();
        tables.signatories.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_signatories(&self, template_id: &str) -> Result<Vec<Signatory>, StoreError> {
        self.check_read()?;
        Ok(self
            .lock()
            .signatories
            .iter()
            .filter(|s| s.template_id.as_deref() == Some(template_id))
            .cloned()
            .collect())
    }

    async fn list_annotations(
        &self,
        template_id: &str,
    ) -> Result<Vec<AnnotationRecord>, StoreError> {
        self.check_read()?;
        Ok(self
            .lock()
            .annotations
            .iter()
            .filter(|a| a.template_id == template_id)
            .cloned()
            .collect())
    }

    async fn upsert_annotations(
        &self,
        rows: Vec<AnnotationUpsert>,
    ) -> Result<Vec<AnnotationRecord>, StoreError> {
        self.check_write()?;
        let mut tables = self.lock();
        tables.upsert_batches.push(rows.clone());

        for row in &rows {
            let Some(id) = row.id.as_deref() else {
                continue;
            };
            if let Some(existing) = tables.annotations.iter().find(|a| a.id == id) {
                if existing.template_id != row.template_id {
                    return Err(StoreError::ForeignAnnotation {
                        id: id.to_string(),
                        template_id: row.template_id.clone(),
                    });
                }
            }
        }

        let mut saved = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let record = row.into_record(id);
            match tables.annotations.iter_mut().find(|a| a.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => tables.annotations.push(record.clone()),
            }
            saved.push(record);
        }
        Ok(saved)
    }
}
