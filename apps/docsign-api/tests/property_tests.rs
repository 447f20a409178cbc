//! Property-based tests for docsign-api
//!
//! Tests the wire models and validation logic the API relies on using proptest.

use docsign_core::{validate_annotation, validate_page_number};
use proptest::prelude::*;
use shared_types::{AnnotationRecord, AnnotationUpsert, AreaId, FieldKind, NewSignatory};

// ============================================================
// Strategies
// ============================================================

/// Store-assigned ids are UUIDs (36 characters with hyphens)
fn persisted_id() -> impl Strategy<Value = String> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
}

/// Editor-assigned ids before the first save
fn temporary_id() -> impl Strategy<Value = String> {
    (0u64..u64::MAX).prop_map(|n| format!("temp-{}", n))
}

fn field_kind() -> impl Strategy<Value = FieldKind> {
    prop::sample::select(FieldKind::ALL.to_vec())
}

fn upsert_row() -> impl Strategy<Value = AnnotationUpsert> {
    (
        prop::option::of(persisted_id()),
        field_kind(),
        0i64..612,
        0i64..792,
        1i64..300,
        1i64..300,
        1u32..20,
        any::<bool>(),
    )
        .prop_map(
            |(id, kind, x, y, width, height, page_number, required)| AnnotationUpsert {
                id,
                name: None,
                description: None,
                required,
                template_id: "tpl".into(),
                signatory_id: None,
                x,
                y,
                width,
                height,
                kind,
                page_number,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ============================================================
    // Area ID Tests
    // ============================================================

    #[test]
    fn temporary_ids_are_never_persisted(id in temporary_id()) {
        let area_id = AreaId::from(id.clone());
        prop_assert!(area_id.is_temporary());
        prop_assert_eq!(area_id.persisted(), None);
        prop_assert_eq!(area_id.as_str(), id.as_str());
    }

    #[test]
    fn uuid_ids_are_persisted(id in persisted_id()) {
        let area_id = AreaId::from(id.clone());
        prop_assert!(!area_id.is_temporary());
        prop_assert_eq!(area_id.persisted(), Some(id.as_str()));
    }

    // ============================================================
    // Field Kind Tests
    // ============================================================

    #[test]
    fn field_kind_wire_name_parses_back(kind in field_kind()) {
        prop_assert_eq!(kind.as_str().parse::<FieldKind>(), Ok(kind));
        let json = serde_json::to_value(kind).unwrap();
        prop_assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
    }

    #[test]
    fn unknown_field_kinds_rejected(name in "[a-z]{3,12}") {
        let known = FieldKind::ALL.iter().any(|k| k.as_str() == name);
        prop_assert_eq!(name.parse::<FieldKind>().is_ok(), known);
    }

    // ============================================================
    // Annotation Row Tests
    // ============================================================

    #[test]
    fn upsert_without_id_is_create(row in upsert_row()) {
        prop_assert_eq!(row.is_create(), row.id.is_none());
    }

    #[test]
    fn upsert_json_uses_type_key(row in upsert_row()) {
        let json = serde_json::to_value(&row).unwrap();
        prop_assert_eq!(json["type"].clone(), kind_json(row.kind));
        prop_assert!(json.get("kind").is_none());
        // A create row carries no id key at all
        prop_assert_eq!(json.get("id").is_some(), row.id.is_some());
    }

    #[test]
    fn into_record_keeps_geometry(row in upsert_row(), id in persisted_id()) {
        let record: AnnotationRecord = row.clone().into_record(id.clone());
        prop_assert_eq!(record.id, id);
        prop_assert_eq!((record.x, record.y, record.width, record.height),
            (row.x, row.y, row.width, row.height));
        prop_assert_eq!(record.page_number, row.page_number);
    }

    #[test]
    fn rows_on_existing_pages_validate(row in upsert_row()) {
        let page_count = row.page_number;
        prop_assert!(validate_annotation(&row, page_count).is_ok());
        prop_assert!(validate_annotation(&row, page_count - 1).is_err());
    }

    #[test]
    fn page_zero_never_validates(page_count in 0u32..1000) {
        prop_assert!(validate_page_number(0, page_count).is_err());
    }

    // ============================================================
    // Signatory Tests
    // ============================================================

    #[test]
    fn well_formed_signatories_validate(
        name in "[A-Za-z]{1,30}",
        local in "[a-z]{1,20}",
        domain in "[a-z]{2,10}",
        phone in "[0-9]{7,12}"
    ) {
        let signatory = NewSignatory {
            name,
            email: format!("{}@{}.com", local, domain),
            phone,
        };
        prop_assert!(signatory.validate().is_ok());
    }

    #[test]
    fn emails_without_at_rejected(email in "[a-z.]{1,30}") {
        let signatory = NewSignatory {
            name: "Ada".into(),
            email,
            phone: "555".into(),
        };
        prop_assert!(signatory.validate().is_err());
    }
}

fn kind_json(kind: FieldKind) -> serde_json::Value {
    serde_json::Value::String(kind.as_str().to_string())
}

// ============================================================
// Unit Tests (non-property)
// ============================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_field_kind_variants() {
        let names: Vec<&str> = FieldKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["text", "textarea", "number", "signature", "date", "checkbox"]
        );
    }

    #[test]
    fn test_invalid_field_kind_message() {
        assert_eq!(
            "stamp".parse::<FieldKind>(),
            Err("Invalid field type: stamp".to_string())
        );
    }
}
