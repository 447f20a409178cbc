//! Editor bound to a store: loads a template's data and saves the batch

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::editor::{AnnotationEditor, EditorError};
use crate::store::TemplateStore;

pub struct EditorSession {
    store: Arc<dyn TemplateStore>,
    editor: AnnotationEditor,
}

impl EditorSession {
    /// Open the editor for a template and fetch its signatories and annotations
    pub async fn open(store: Arc<dyn TemplateStore>, template_id: impl Into<String>) -> Self {
        let mut session = Self {
            store,
            editor: AnnotationEditor::new(template_id),
        };
        session.reload().await;
        session
    }

    pub fn editor(&self) -> &AnnotationEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut AnnotationEditor {
        &mut self.editor
    }

    /// Fetch signatories and annotations concurrently.
    ///
    /// A failed fetch is logged and leaves that list empty; the other still loads.
    pub async fn reload(&mut self) {
        let template_id = self.editor.template_id().to_string();
        let (signatories, annotations) = futures::join!(
            self.store.list_signatories(&template_id),
            self.store.list_annotations(&template_id)
        );

        match signatories {
            Ok(rows) => {
                debug!(template_id = %template_id, count = rows.len(), "Loaded signatories");
                self.editor.replace_signatories(rows);
            }
            Err(e) => {
                error!(template_id = %template_id, error = %e, "Error fetching signatories");
                self.editor.replace_signatories(Vec::new());
            }
        }

        match annotations {
            Ok(rows) => {
                debug!(template_id = %template_id, count = rows.len(), "Loaded annotations");
                self.editor.replace_areas(rows);
            }
            Err(e) => {
                error!(template_id = %template_id, error = %e, "Error fetching annotations");
                self.editor.replace_areas(Vec::new());
            }
        }
    }

    /// Send every area to the store in one upsert.
    ///
    /// On success temporary ids are replaced by the stored ones. On failure the
    /// editor is left exactly as it was. Returns the number of rows sent.
    pub async fn save(&mut self) -> Result<usize, EditorError> {
        let batch = self.editor.save_batch();
        let count = batch.len();
        let creates = batch.iter().filter(|row| row.is_create()).count();

        match self.store.upsert_annotations(batch).await {
            Ok(records) => {
                self.editor.apply_saved(records)?;
                info!(
                    template_id = %self.editor.template_id(),
                    count,
                    creates,
                    "Annotations saved"
                );
                Ok(count)
            }
            Err(e) => {
                error!(
                    template_id = %self.editor.template_id(),
                    error = %e,
                    "Error saving annotations"
                );
                Err(e.into())
            }
        }
    }
}
