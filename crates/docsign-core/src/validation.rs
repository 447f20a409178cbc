//! Checks applied to annotation rows before they are persisted

use shared_types::AnnotationUpsert;

/// Validate a save row against the document it belongs to.
///
/// Only the page reference and sign of the size are checked; the rectangle is
/// not required to lie inside the page.
pub fn validate_annotation(row: &AnnotationUpsert, page_count: u32) -> Result<(), &'static str> {
    if row.template_id.is_empty() {
        return Err("Annotation template id must not be empty");
    }
    validate_page_number(row.page_number, page_count)?;
    if row.width < 0 || row.height < 0 {
        return Err("Annotation size must not be negative");
    }
    Ok(())
}

/// Page numbers are 1-indexed and must exist in the document
pub fn validate_page_number(page_number: u32, page_count: u32) -> Result<(), &'static str> {
    if page_number == 0 {
        return Err("Page number must start at 1");
    }
    if page_number > page_count {
        return Err("Page number is beyond the last page");
    }
    Ok(())
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::FieldKind;

    fn row(page_number: u32, width: i64, height: i64) -> AnnotationUpsert {
        AnnotationUpsert {
            id: None,
            name: None,
            description: None,
            required: false,
            template_id: "tpl".into(),
            signatory_id: None,
            x: 0,
            y: 0,
            width,
            height,
            kind: FieldKind::Text,
            page_number,
        }
    }

    proptest! {
        #[test]
        fn existing_page_is_valid(
            page_count in 1u32..500,
            offset in 0u32..500,
        ) {
            let page = offset % page_count + 1;
            prop_assert!(validate_page_number(page, page_count).is_ok());
        }

        #[test]
        fn page_past_end_is_invalid(
            page_count in 0u32..500,
            extra in 1u32..100,
        ) {
            prop_assert!(validate_page_number(page_count + extra, page_count).is_err());
        }

        #[test]
        fn negative_size_is_invalid(
            width in -1000i64..0,
            height in 0i64..1000,
        ) {
            prop_assert!(validate_annotation(&row(1, width, height), 1).is_err());
            prop_assert!(validate_annotation(&row(1, height, width), 1).is_err());
        }

        #[test]
        fn size_and_page_in_range_is_valid(
            width in 0i64..10_000,
            height in 0i64..10_000,
        ) {
            prop_assert!(validate_annotation(&row(1, width, height), 3).is_ok());
        }
    }

    #[test]
    fn page_zero_is_invalid() {
        assert_eq!(
            validate_page_number(0, 3),
            Err("Page number must start at 1")
        );
    }

    #[test]
    fn empty_template_id_is_invalid() {
        let mut r = row(1, 10, 10);
        r.template_id.clear();
        assert!(validate_annotation(&r, 1).is_err());
    }
}
