//! Template annotation core logic
//!
//! This crate holds the annotation editor state machine, the store seam it
//! persists through, and validation shared with the HTTP service.

pub mod editor;
pub mod session;
pub mod store;
pub mod validation;

pub use editor::{AnnotationEditor, AreaPatch, AreaState, EditorError, Marker};
pub use session::EditorSession;
pub use store::{MemoryStore, StoreError, TemplateStore};
pub use validation::{validate_annotation, validate_page_number};

// Re-export types from shared crates
pub use shared_pdf::{PdfDocument, Viewport};
pub use shared_types::{AnnotationArea, AnnotationRecord, AnnotationUpsert, AreaId, FieldKind};
