//! Field placements (annotation areas) and their stored/saved forms

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::DocRect;

/// Prefix that marks an area id as client-side only (never saved)
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Kind of signer-facing field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    /// Multiline text
    Textarea,
    Number,
    Signature,
    Date,
    Checkbox,
}

impl FieldKind {
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Text,
        FieldKind::Textarea,
        FieldKind::Number,
        FieldKind::Signature,
        FieldKind::Date,
        FieldKind::Checkbox,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Number => "number",
            FieldKind::Signature => "signature",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldKind::Text),
            "textarea" => Ok(FieldKind::Textarea),
            "number" => Ok(FieldKind::Number),
            "signature" => Ok(FieldKind::Signature),
            "date" => Ok(FieldKind::Date),
            "checkbox" => Ok(FieldKind::Checkbox),
            other => Err(format!("Invalid field type: {}", other)),
        }
    }
}

/// Identifier of an annotation area.
///
/// Areas added in the editor carry a `temp-<n>` id until the first save, after
/// which the id assigned by the store replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AreaId {
    Temporary(String),
    Persisted(String),
}

impl AreaId {
    pub fn temporary(seq: u64) -> Self {
        AreaId::Temporary(format!("{}{}", TEMP_ID_PREFIX, seq))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, AreaId::Temporary(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            AreaId::Temporary(s) | AreaId::Persisted(s) => s,
        }
    }

    /// Store id, if this area has been saved
    pub fn persisted(&self) -> Option<&str> {
        match self {
            AreaId::Persisted(s) => Some(s),
            AreaId::Temporary(_) => None,
        }
    }
}

impl From<String> for AreaId {
    fn from(s: String) -> Self {
        if s.starts_with(TEMP_ID_PREFIX) {
            AreaId::Temporary(s)
        } else {
            AreaId::Persisted(s)
        }
    }
}

impl From<&str> for AreaId {
    fn from(s: &str) -> Self {
        AreaId::from(s.to_string())
    }
}

impl From<AreaId> for String {
    fn from(id: AreaId) -> Self {
        match id {
            AreaId::Temporary(s) | AreaId::Persisted(s) => s,
        }
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rectangular field placement held in memory by the editor.
///
/// Coordinates keep full precision; they are only rounded when a save batch is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationArea {
    pub id: AreaId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub template_id: Option<String>,
    pub signatory_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub page_number: u32,
    #[serde(flatten)]
    pub rect: DocRect,
}

impl AnnotationArea {
    /// Label shown on the marker: the field name, or the kind when unnamed
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.kind.as_str(),
        }
    }
}

/// An annotation row as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub template_id: String,
    pub signatory_id: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub page_number: u32,
}

impl From<AnnotationRecord> for AnnotationArea {
    fn from(record: AnnotationRecord) -> Self {
        Self {
            id: AreaId::Persisted(record.id),
            name: record.name,
            description: record.description,
            required: record.required,
            template_id: Some(record.template_id),
            signatory_id: record.signatory_id,
            kind: record.kind,
            page_number: record.page_number,
            rect: DocRect::new(
                record.x as f64,
                record.y as f64,
                record.width as f64,
                record.height as f64,
            ),
        }
    }
}

/// One row of a save batch.
///
/// `id: None` creates a new row; `id: Some` updates the row with that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationUpsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub template_id: String,
    pub signatory_id: Option<String>,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub page_number: u32,
}

impl AnnotationUpsert {
    /// Build the save row for an in-memory area, rounding its rectangle
    pub fn from_area(area: &AnnotationArea, template_id: &str) -> Self {
        let [x, y, width, height] = area.rect.rounded();
        Self {
            id: area.id.persisted().map(str::to_string),
            name: area.name.clone(),
            description: area.description.clone(),
            required: area.required,
            template_id: template_id.to_string(),
            signatory_id: area.signatory_id.clone(),
            x,
            y,
            width,
            height,
            kind: area.kind,
            page_number: area.page_number,
        }
    }

    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }

    /// Turn the row into a stored record once the store has assigned an id
    pub fn into_record(self, id: String) -> AnnotationRecord {
        AnnotationRecord {
            id,
            name: self.name,
            description: self.description,
            required: self.required,
            template_id: self.template_id,
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_area(id: AreaId) -> AnnotationArea {
        AnnotationArea {
            id,
            name: Some("Client signature".to_string()),
            description: None,
            required: true,
            template_id: None,
            signatory_id: Some("sig-1".to_string()),
            kind: FieldKind::Signature,
            page_number: 2,
            rect: DocRect::new(50.4, 691.6, 100.2, 49.5),
        }
    }

    #[test]
    fn test_area_id_prefix_detection() {
        assert!(AreaId::from("temp-1700000000000").is_temporary());
        assert!(!AreaId::from("6f1c9d8e-0000-4000-8000-000000000000").is_temporary());
        assert_eq!(AreaId::temporary(7).as_str(), "temp-7");
    }

    #[test]
    fn test_area_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AreaId::temporary(3)).unwrap();
        assert_eq!(json, "\"temp-3\"");
        let back: AreaId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, AreaId::Persisted("abc".to_string()));
    }

    #[test]
    fn test_field_kind_parsing() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
        assert_eq!("Textarea".parse::<FieldKind>().unwrap(), FieldKind::Textarea);
        assert!("initials".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_area_json_uses_type_and_flat_rect() {
        let json = serde_json::to_value(sample_area(AreaId::temporary(1))).unwrap();
        assert_eq!(json["type"], "signature");
        assert_eq!(json["x"], 50.4);
        assert_eq!(json["id"], "temp-1");
        assert!(json.get("rect").is_none());
    }

    #[test]
    fn test_upsert_from_temporary_area_is_create() {
        let row = AnnotationUpsert::from_area(&sample_area(AreaId::temporary(1)), "tpl-1");
        assert!(row.is_create());
        assert_eq!(row.template_id, "tpl-1");
        // right 150.6 -> 151, top 741.1 -> 741
        assert_eq!((row.x, row.y, row.width, row.height), (50, 692, 101, 49));
    }

    #[test]
    fn test_upsert_from_persisted_area_is_update() {
        let row = AnnotationUpsert::from_area(&sample_area(AreaId::from("row-9")), "tpl-1");
        assert_eq!(row.id.as_deref(), Some("row-9"));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], "row-9");
    }

    #[test]
    fn test_create_row_omits_id() {
        let row = AnnotationUpsert::from_area(&sample_area(AreaId::temporary(1)), "tpl-1");
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_record_into_area() {
        let record = AnnotationUpsert::from_area(&sample_area(AreaId::temporary(1)), "tpl-1")
            .into_record("row-1".to_string());
        let area = AnnotationArea::from(record);
        assert_eq!(area.id, AreaId::Persisted("row-1".to_string()));
        assert_eq!(area.template_id.as_deref(), Some("tpl-1"));
        assert_eq!(area.rect, DocRect::new(50.0, 692.0, 101.0, 49.0));
    }

    #[test]
    fn test_label_falls_back_to_kind() {
        let mut area = sample_area(AreaId::temporary(1));
        assert_eq!(area.label(), "Client signature");
        area.name = Some(String::new());
        assert_eq!(area.label(), "signature");
        area.name = None;
        assert_eq!(area.label(), "signature");
    }
}
