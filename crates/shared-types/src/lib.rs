pub mod annotation;
pub mod geometry;
pub mod types;

pub use annotation::{
    AnnotationArea, AnnotationRecord, AnnotationUpsert, AreaId, FieldKind, TEMP_ID_PREFIX,
};
pub use geometry::{DocRect, PageInfo, PageSize, ScreenRect};
pub use types::{NewSignatory, Signatory, Template};
