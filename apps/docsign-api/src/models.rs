//! Request bodies for DocSign API

use serde::{Deserialize, Serialize};
use shared_types::{AnnotationUpsert, AreaId, FieldKind, NewSignatory};

/// Body of `POST /api/templates/:id/signatories`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSignatoriesRequest {
    pub signatories: Vec<NewSignatory>,
}

/// One annotation as sent by the editor; the template comes from the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationInput {
    /// Missing or temporary ids create a new row
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub signatory_id: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub page_number: u32,
}

impl AnnotationInput {
    pub fn into_upsert(self, template_id: &str) -> AnnotationUpsert {
        let id = self
            .id
            .map(AreaId::from)
            .and_then(|id| id.persisted().map(str::to_string));
        AnnotationUpsert {
            id,
            name: self.name,
            description: self.description,
            required: self.required,
            template_id: template_id.to_string(),
            signatory_id: self.signatory_id,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            kind: self.kind,
            page_number: self.page_number,
        }
    }
}

/// Body of `PUT /api/templates/:id/annotations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAnnotationsRequest {
    pub annotations: Vec<AnnotationInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_id_becomes_create() {
        let input: AnnotationInput = serde_json::from_value(serde_json::json!({
            "id": "temp-1712",
            "x": 50, "y": 692, "width": 100, "height": 50,
            "type": "signature",
            "page_number": 1
        }))
        .unwrap();
        let row = input.into_upsert("tpl");
        assert!(row.is_create());
        assert_eq!(row.template_id, "tpl");
        assert!(!row.required);
    }

    #[test]
    fn test_persisted_id_is_kept() {
        let input: AnnotationInput = serde_json::from_value(serde_json::json!({
            "id": "9b2f",
            "name": "Date signed",
            "required": true,
            "x": 1, "y": 2, "width": 3, "height": 4,
            "type": "date",
            "page_number": 2
        }))
        .unwrap();
        let row = input.into_upsert("tpl");
        assert_eq!(row.id.as_deref(), Some("9b2f"));
        assert_eq!(row.kind, FieldKind::Date);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<AnnotationInput, _> = serde_json::from_value(serde_json::json!({
            "x": 1, "y": 2, "width": 3, "height": 4,
            "type": "stamp",
            "page_number": 1
        }));
        assert!(result.is_err());
    }
}
